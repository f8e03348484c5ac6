//! Authentication integration tests over real HTTP.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use liquidgate_auth::sign_message;
    use liquidgate_http::dispatch::UpstreamFuture;
    use liquidgate_http::response::json_response;
    use liquidgate_http::{AcknowledgeHandler, AuthenticatedRequest, UpstreamHandler};

    use crate::{
        API_KEY, PARTNER_ID, PAYMENT_BODY, SECRET, client, partner_credential, spawn_gateway,
    };

    fn signature(body: &str) -> String {
        sign_message(body.as_bytes(), SECRET.as_bytes(), None).to_string()
    }

    async fn json(resp: reqwest::Response) -> serde_json::Value {
        resp.json().await.expect("JSON response body")
    }

    #[tokio::test]
    async fn test_should_serve_health_without_credentials() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;

        for path in ["/health", "/_health"] {
            let resp = client().get(gateway.url(path)).send().await.unwrap();
            assert_eq!(resp.status(), 200);
            let body = json(resp).await;
            assert_eq!(body["status"], "running");
            assert!(body["version"].is_string());
        }
    }

    #[tokio::test]
    async fn test_should_accept_get_with_api_key_only() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;

        let resp = client()
            .get(gateway.url("/v1/transactions"))
            .header("X-Api-Key", API_KEY)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body = json(resp).await;
        assert_eq!(body["status"], "authenticated");
        assert_eq!(body["partner_id"], PARTNER_ID);
    }

    #[tokio::test]
    async fn test_should_accept_legacy_liquid_api_key_header() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;

        let resp = client()
            .get(gateway.url("/v1/transactions"))
            .header("Liquid-Api-Key", API_KEY)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_should_reject_missing_api_key() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;

        let resp = client()
            .get(gateway.url("/v1/transactions"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/json"
        );
        let body = json(resp).await;
        assert_eq!(body["error_code"], "00400001");
        assert_eq!(body["error_description"], "Apikey is missing or invalid");
    }

    #[tokio::test]
    async fn test_should_accept_signed_post() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;

        let resp = client()
            .post(gateway.url("/v1/payments"))
            .header("X-Api-Key", API_KEY)
            .header("Signature", signature(PAYMENT_BODY))
            .body(PAYMENT_BODY)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_should_accept_reformatted_body_with_same_content() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;
        let reformatted =
            "{\n  \"partner_id\": \"500001\",\n  \"payee\": \"PayeeLiquid\",\n  \"crn\": \"12345\"\n}";

        let resp = client()
            .put(gateway.url("/v1/payments"))
            .header("X-Api-Key", API_KEY)
            .header("Signature", signature(PAYMENT_BODY))
            .body(reformatted)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_should_reject_post_without_signature() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;

        let resp = client()
            .post(gateway.url("/v1/payments"))
            .header("X-Api-Key", API_KEY)
            .body(PAYMENT_BODY)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        let body = json(resp).await;
        assert_eq!(body["error_code"], "00400002");
        assert_eq!(body["error_description"], "Invalid signature");
    }

    #[tokio::test]
    async fn test_should_reject_delete_signed_with_wrong_secret() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;
        let forged = sign_message(PAYMENT_BODY.as_bytes(), b"not-the-secret", None).to_string();

        let resp = client()
            .delete(gateway.url("/v1/payments/12345"))
            .header("X-Api-Key", API_KEY)
            .header("Signature", forged)
            .body(PAYMENT_BODY)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        assert_eq!(json(resp).await["error_code"], "00400002");
    }

    #[tokio::test]
    async fn test_should_reject_tampered_amount() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;
        let tampered = PAYMENT_BODY.replace("12345", "12346");

        let resp = client()
            .post(gateway.url("/v1/payments"))
            .header("X-Api-Key", API_KEY)
            .header("Signature", signature(PAYMENT_BODY))
            .body(tampered)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        assert_eq!(json(resp).await["error_code"], "00400002");
    }

    #[tokio::test]
    async fn test_should_reject_malformed_signature_header() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;

        for header in ["garbage", "t=abc,digest", "t=1686751618"] {
            let resp = client()
                .post(gateway.url("/v1/payments"))
                .header("X-Api-Key", API_KEY)
                .header("Signature", header)
                .body(PAYMENT_BODY)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 401, "header {header:?}");
            assert_eq!(json(resp).await["error_code"], "00400002");
        }
    }

    #[tokio::test]
    async fn test_should_reject_patch_with_apikey_code() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;

        let resp = client()
            .patch(gateway.url("/v1/payments"))
            .header("X-Api-Key", API_KEY)
            .header("Signature", signature(PAYMENT_BODY))
            .body(PAYMENT_BODY)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        assert_eq!(json(resp).await["error_code"], "00400001");
    }

    #[tokio::test]
    async fn test_should_echo_request_id() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;

        let resp = client()
            .get(gateway.url("/v1/transactions"))
            .header("X-Api-Key", "unknown")
            .header("X-Request-ID", "trace-abc")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        assert_eq!(resp.headers().get("x-request-id").unwrap(), "trace-abc");
    }

    /// Captures what the upstream side received.
    #[derive(Debug, Default)]
    struct RecordingHandler {
        seen: Arc<Mutex<Vec<(String, Bytes)>>>,
    }

    impl UpstreamHandler for RecordingHandler {
        fn handle(&self, request: AuthenticatedRequest) -> UpstreamFuture {
            self.seen
                .lock()
                .unwrap()
                .push((request.decision.partner_id.clone(), request.body.clone()));
            Box::pin(async move {
                Ok(json_response(
                    http::StatusCode::ACCEPTED,
                    b"{}".to_vec(),
                    &request.request_id,
                ))
            })
        }
    }

    #[tokio::test]
    async fn test_should_hand_raw_body_and_partner_to_upstream() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler {
            seen: Arc::clone(&seen),
        };
        let gateway = spawn_gateway(handler, vec![partner_credential()]).await;

        let resp = client()
            .post(gateway.url("/v1/payments"))
            .header("X-Api-Key", API_KEY)
            .header("Signature", signature(PAYMENT_BODY))
            .body(PAYMENT_BODY)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 202);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, PARTNER_ID);
        assert_eq!(seen[0].1, PAYMENT_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_should_not_call_upstream_for_rejected_request() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler {
            seen: Arc::clone(&seen),
        };
        let gateway = spawn_gateway(handler, vec![partner_credential()]).await;

        let resp = client()
            .post(gateway.url("/v1/payments"))
            .header("X-Api-Key", API_KEY)
            .body(PAYMENT_BODY)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        assert!(seen.lock().unwrap().is_empty());
    }
}
