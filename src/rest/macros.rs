/// Implements `From` and `PartialEq` between an enum and the payload types of its
/// single-field variants.
///
/// # Example
/// ```rust,ignore
/// // `From<SecurityValue> for ChangeValue`, `PartialEq<SecurityValue> for ChangeValue`, ...
/// enum_traits!(|ChangeValue| SecurityValue => Security, HistoryValue => History);
/// ```
macro_rules! enum_traits {
    (|$target:ident| $($content:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$content> for $target {
                #[inline]
                fn from(value: $content) -> Self {
                    Self::$variant(value)
                }
            }

            impl PartialEq<$content> for $target {
                #[inline]
                fn eq(&self, other: &$content) -> bool {
                    match self {
                        Self::$variant(inner) => inner.eq(other),
                        #[allow(unreachable_patterns)]
                        _ => false,
                    }
                }
            }
        )*
    }
}

/// Implements `std::future::IntoFuture` for a type from one of its methods.
///
/// The method must consume `self` and return `impl Future`. On nightly the
/// future type is named directly; on stable it is boxed.
macro_rules! IntoFuture {
    (
        impl $name:ident {
            $(#[$meta:meta])*
            pub fn $func:ident ( $($args:tt)* ) -> impl Future<Output = $ret:ty> + $fut_life:lifetime $body:block
        }
    ) => {
        impl $name {
            $(#[$meta])*
            pub fn $func($($args)*) -> impl ::std::future::Future<Output = $ret> + $fut_life $body
        }

        #[cfg(nightly_rust)]
        impl ::std::future::IntoFuture for $name {
            type Output = $ret;
            type IntoFuture = impl ::std::future::Future<Output = Self::Output> + $fut_life;

            fn into_future(self) -> Self::IntoFuture {
                self.$func()
            }
        }

        #[cfg(not(nightly_rust))]
        impl ::std::future::IntoFuture for $name {
            type Output = $ret;
            type IntoFuture =
                ::std::pin::Pin<Box<dyn ::std::future::Future<Output = Self::Output> + Send + $fut_life>>;

            fn into_future(self) -> Self::IntoFuture {
                Box::pin(self.$func())
            }
        }
    };
}

/// Declares the closed event family together with its subscription key.
///
/// For every `Variant(Payload) = "tag"` line this generates:
/// - a variant on the event enum carrying the payload,
/// - a unit variant on the key enum,
/// - the `"tag"` string used by `as_str`, `Display` and `FromStr`.
///
/// Several variants may share one payload type; the key is what tells them apart.
macro_rules! events {
    (
        $(#[$meta:meta])*
        pub enum $name:ident keyed by $kind:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident($payload:ty) = $tag:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        #[non_exhaustive]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant($payload),
            )*
        }

        #[doc = concat!("The subscription key of an [`", stringify!($name), "`].")]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[non_exhaustive]
        pub enum $kind {
            $(
                $(#[$vmeta])*
                $variant,
            )*
        }

        impl $kind {
            /// Every key, in declaration order.
            pub const ALL: &'static [$kind] = &[$($kind::$variant),*];

            /// The stable string tag of this key.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $tag,)*
                }
            }
        }

        impl ::std::fmt::Display for $kind {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $kind {
            type Err = UnknownEventType;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok(Self::$variant),)*
                    other => Err(UnknownEventType(other.to_owned())),
                }
            }
        }

        impl $name {
            /// The key subscribers use to receive this event.
            pub fn event_type(&self) -> $kind {
                match self {
                    $(Self::$variant(_) => $kind::$variant,)*
                }
            }
        }
    };
}

/// Declares the discriminator → schema table for webhook changes.
///
/// Each `"field" => Variant(Schema)` line adds a `ChangeValue` variant and a
/// decoder that re-materializes an opaque JSON value into `Schema`. Extra
/// `| "alias"` tags route to the same decoder.
macro_rules! change_table {
    (
        $(
            $(#[$vmeta:meta])*
            $tag:literal $(| $alias:literal)* => $variant:ident($schema:ty)
        ),* $(,)?
    ) => {
        /// A change value decoded into the schema its `field` names.
        #[derive(Clone, Debug, PartialEq)]
        #[non_exhaustive]
        pub enum ChangeValue {
            $(
                $(#[$vmeta])*
                $variant($schema),
            )*
        }

        impl ChangeValue {
            /// The canonical discriminator of this value.
            pub fn field(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $tag,)*
                }
            }
        }

        enum_traits!(|ChangeValue| $($schema => $variant),*);

        const DECODERS: &[(&str, Decoder)] = &[
            $(
                ($tag, |value: serde_json::Value| serde_json::from_value::<$schema>(value).map(ChangeValue::$variant)),
                $(
                    ($alias, |value: serde_json::Value| serde_json::from_value::<$schema>(value).map(ChangeValue::$variant)),
                )*
            )*
        ];
    };
}
