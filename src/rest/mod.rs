//! Internals shared by the webhook pipeline: the ingestion pipeline itself, the
//! HTTP handlers, outbound request execution and wire helpers.

use serde::{Deserialize, Deserializer};
use std::{fmt::Display, str::FromStr};

#[macro_use]
pub(crate) mod macros;
pub(crate) mod client;
pub(crate) mod process;
pub(crate) mod server;

/// The platform sends several numeric fields either as JSON numbers or as
/// strings. This lets either shape through.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawOr<T> {
    Raw(String),
    Tee(T),
}

pub(crate) fn deserialize_str<'de, T, D: Deserializer<'de>>(deserializer: D) -> Result<T, D::Error>
where
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    match <RawOr<T>>::deserialize(deserializer)? {
        RawOr::Raw(s) => T::from_str(s.trim())
            .map_err(|err| <D::Error as serde::de::Error>::custom(format!("parsing value: {err}"))),
        RawOr::Tee(n) => Ok(n),
    }
}

pub(crate) fn deserialize_str_opt<'de, T, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<T>, D::Error>
where
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    let Some(v) = <Option<RawOr<T>>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    match v {
        // Empty strings stand in for "absent" on a few fields.
        RawOr::Raw(s) if s.trim().is_empty() => Ok(None),
        RawOr::Raw(s) => T::from_str(s.trim()).map(Some).map_err(|err| {
            <D::Error as serde::de::Error>::custom(format!("parsing value: {err}"))
        }),
        RawOr::Tee(n) => Ok(Some(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize, Debug, PartialEq)]
    struct ProductLine {
        #[serde(deserialize_with = "deserialize_str")]
        quantity: u32,
        #[serde(default, deserialize_with = "deserialize_str_opt")]
        item_price: Option<f64>,
    }

    #[test]
    fn numbers_decode_from_either_encoding() {
        let a: ProductLine = serde_json::from_str(r#"{"quantity": 2, "item_price": 10.5}"#).unwrap();
        let b: ProductLine =
            serde_json::from_str(r#"{"quantity": "2", "item_price": "10.5"}"#).unwrap();
        assert_eq!(a, b);

        let c: ProductLine = serde_json::from_str(r#"{"quantity": "3", "item_price": ""}"#).unwrap();
        assert_eq!(c.item_price, None);

        let d: ProductLine = serde_json::from_str(r#"{"quantity": "3"}"#).unwrap();
        assert_eq!(d.item_price, None);
    }

    #[test]
    fn garbage_strings_are_rejected() {
        let err = serde_json::from_str::<ProductLine>(r#"{"quantity": "two"}"#).unwrap_err();
        assert!(err.to_string().contains("parsing value"));
    }
}
