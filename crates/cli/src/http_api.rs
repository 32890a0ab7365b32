use crate::command::{CommandResponse, ResponseMeta};
use crate::server_security::BearerToken;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, HeaderMap, Response as HttpResponse, StatusCode},
    response::Response,
};
use diacare_protocol::{codes, serialize_json, ErrorEnvelope};

pub(crate) fn is_authorized(headers: &HeaderMap, token: &BearerToken) -> bool {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return false;
    };
    let Ok(value) = value.to_str() else {
        return false;
    };
    token.accepts(value)
}

pub(crate) fn error_response(code: &str, message: String) -> CommandResponse {
    let hint = match code {
        codes::UNAUTHORIZED => {
            "The server requires Authorization: Bearer <token> (see --auth-token, server.auth_token or DIACARE_AUTH_TOKEN)."
        }
        codes::INVALID_REQUEST => {
            "Verify the request is valid JSON and matches the Command API schema."
        }
        _ => "Check the request against the Command API schema.",
    };
    CommandResponse::error(
        ErrorEnvelope::new(code, message).with_hint(hint),
        ResponseMeta::default(),
    )
}

pub(crate) fn unauthorized() -> Result<Response, StatusCode> {
    let response = error_response(
        codes::UNAUTHORIZED,
        "Missing or invalid Authorization header".to_string(),
    );
    build_response(StatusCode::UNAUTHORIZED, &response)
}

pub(crate) fn build_response(
    status: StatusCode,
    response: &CommandResponse,
) -> Result<Response, StatusCode> {
    let bytes = serialize_json(response)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .into_bytes();
    json_response(status, bytes)
}

pub(crate) fn json_response(status: StatusCode, bytes: Vec<u8>) -> Result<Response, StatusCode> {
    let mut builder = HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json");

    if status == StatusCode::UNAUTHORIZED {
        builder = builder.header("www-authenticate", "Bearer");
    }

    builder
        .body(Body::from(bytes))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn authorization_header_must_carry_the_token() {
        let token = BearerToken::new("s3cret").unwrap();
        let mut headers = HeaderMap::new();
        assert!(!is_authorized(&headers, &token));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert!(is_authorized(&headers, &token));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert!(!is_authorized(&headers, &token));
    }

    #[test]
    fn unauthorized_responses_ask_for_bearer() {
        let response = unauthorized().unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("www-authenticate").unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn error_response_carries_code_and_hint() {
        let response = error_response(codes::INVALID_REQUEST, "bad".to_string());
        let error = response.error.unwrap();
        assert_eq!(error.code, "invalid_request");
        assert!(error.hint.unwrap().contains("valid JSON"));
    }
}
