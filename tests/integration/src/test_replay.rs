//! Replay-window integration tests.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use liquidgate_auth::clock::unix_now;
    use liquidgate_auth::{Credential, sign_message};
    use liquidgate_http::AcknowledgeHandler;

    use crate::{
        API_KEY, PARTNER_ID, PAYMENT_BODY, SECRET, client, partner_credential, spawn_gateway,
    };

    async fn post_signed_at(base: &crate::TestGateway, timestamp: i64) -> reqwest::Response {
        let signature = sign_message(PAYMENT_BODY.as_bytes(), SECRET.as_bytes(), Some(timestamp));
        client()
            .post(base.url("/v1/payments"))
            .header("X-Api-Key", API_KEY)
            .header("Signature", signature.to_string())
            .body(PAYMENT_BODY)
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_should_accept_signature_inside_window() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;
        let resp = post_signed_at(&gateway, unix_now() - 300).await;
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_should_reject_stale_signature() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;
        let resp = post_signed_at(&gateway, unix_now() - 2 * 3600).await;
        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error_code"], "00400002");
    }

    #[tokio::test]
    async fn test_should_reject_signature_from_the_future() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;
        let resp = post_signed_at(&gateway, unix_now() + 2 * 3600).await;
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    async fn test_should_apply_per_partner_window() {
        let strict = Credential::new(API_KEY, SECRET, PARTNER_ID, Duration::from_secs(30));
        let gateway = spawn_gateway(AcknowledgeHandler, vec![strict]).await;

        let resp = post_signed_at(&gateway, unix_now() - 300).await;
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    async fn test_should_accept_same_signature_twice_within_window() {
        let gateway = spawn_gateway(AcknowledgeHandler, vec![partner_credential()]).await;
        let timestamp = unix_now();

        assert_eq!(post_signed_at(&gateway, timestamp).await.status(), 200);
        assert_eq!(post_signed_at(&gateway, timestamp).await.status(), 200);
    }
}
