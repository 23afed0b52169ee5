use reqwest::{Method, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    MetaError,
    client::{Client, Requester},
    error::{Error, ServiceError, ServiceErrorKind},
};

impl Requester for Client {
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Vec<u8>, Error> {
        let url = self.inner.endpoint.join(path);
        debug!(%method, %url, "graph request");

        let mut request = self.inner.http_client.request(method, &url);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Self::handle_response(response, path).await
    }
}

impl Client {
    /// Hands back the body of a successful response, or maps the Graph error.
    pub(crate) async fn handle_response(
        response: Response,
        endpoint: &str,
    ) -> Result<Vec<u8>, Error> {
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            Ok(body.to_vec())
        } else {
            Err(Self::handle_not_ok(&body).service(endpoint, status).into())
        }
    }

    #[inline(always)]
    fn handle_not_ok(body: &[u8]) -> ServiceErrorKind {
        // {"error": {...}}
        #[derive(Deserialize, Debug)]
        struct Error {
            error: MetaError,
        }
        match serde_json::from_slice::<Error>(body) {
            Ok(structured_error) => ServiceError::api(structured_error.error),
            Err(structured_parse) => ServiceError::parse(
                structured_parse.into(),
                String::from_utf8_lossy(body).to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_errors_are_structured() {
        let body = br#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190,"fbtrace_id":"Ax"}}"#;
        let ServiceErrorKind::Api(api) = Client::handle_not_ok(body) else {
            panic!("expected an api error");
        };
        assert_eq!(api.error.code, 190);
        assert_eq!(api.error.message.as_deref(), Some("Invalid OAuth access token."));
    }

    #[test]
    fn unexpected_error_bodies_keep_the_raw_text() {
        let ServiceErrorKind::Parse(parse) = Client::handle_not_ok(b"<html>bad gateway</html>") else {
            panic!("expected a parse error");
        };
        assert_eq!(parse.body, "<html>bad gateway</html>");
    }
}
