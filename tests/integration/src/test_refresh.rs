//! Credential source and refresh integration tests.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use liquidgate_auth::CredentialRegistry;
    use liquidgate_http::AcknowledgeHandler;
    use liquidgate_partners::{
        CredentialRefresher, CredentialSource, FileCredentialSource, PartnerProfileSource,
        SourceError,
    };
    use serde_json::json;
    use tokio::sync::watch;

    use crate::{ProfileStub, TEST_SKEW, TestGateway, client, spawn_gateway_with_registry};

    fn profile(api_key: &str, name: &str) -> serde_json::Value {
        json!({
            "id": 1,
            "acqId": format!("ACQ-{name}"),
            "name": name,
            "apiKey": api_key,
            "secret": "hello",
            "settlement_fee": "0.5",
        })
    }

    async fn get_status(gateway: &TestGateway, api_key: &str) -> u16 {
        client()
            .get(gateway.url("/v1/transactions"))
            .header("X-Api-Key", api_key)
            .send()
            .await
            .unwrap()
            .status()
            .as_u16()
    }

    async fn boot(source: Arc<dyn CredentialSource>) -> (CredentialRefresher, TestGateway) {
        let registry = Arc::new(CredentialRegistry::new());
        let refresher =
            CredentialRefresher::new(source, Arc::clone(&registry), Duration::from_millis(20));
        refresher.load_initial().await.unwrap();
        let gateway = spawn_gateway_with_registry(AcknowledgeHandler, registry).await;
        (refresher, gateway)
    }

    #[tokio::test]
    async fn test_should_boot_from_profile_service() {
        let stub = ProfileStub::start(json!([profile("ak-1", "alpha")])).await;
        let source = PartnerProfileSource::new(&stub.base_url, TEST_SKEW).unwrap();
        let (_refresher, gateway) = boot(Arc::new(source)).await;

        assert_eq!(get_status(&gateway, "ak-1").await, 200);
        assert_eq!(get_status(&gateway, "ak-2").await, 401);
    }

    #[tokio::test]
    async fn test_should_pick_up_rotated_keys_on_refresh() {
        let stub = ProfileStub::start(json!([profile("ak-1", "alpha")])).await;
        let source = PartnerProfileSource::new(&stub.base_url, TEST_SKEW).unwrap();
        let (refresher, gateway) = boot(Arc::new(source)).await;

        stub.set_profiles(json!([profile("ak-2", "alpha")]));
        assert_eq!(refresher.refresh_once().await.unwrap(), 1);

        assert_eq!(get_status(&gateway, "ak-1").await, 401);
        assert_eq!(get_status(&gateway, "ak-2").await, 200);
    }

    #[tokio::test]
    async fn test_should_keep_serving_when_profile_service_fails() {
        let stub = ProfileStub::start(json!([profile("ak-1", "alpha")])).await;
        let source = PartnerProfileSource::new(&stub.base_url, TEST_SKEW).unwrap();
        let (refresher, gateway) = boot(Arc::new(source)).await;

        stub.fail_with(503);
        assert!(matches!(
            refresher.refresh_once().await,
            Err(SourceError::Status(503))
        ));
        assert_eq!(get_status(&gateway, "ak-1").await, 200);
    }

    #[tokio::test]
    async fn test_should_refresh_in_background_until_shutdown() {
        let stub = ProfileStub::start(json!([profile("ak-1", "alpha")])).await;
        let source = PartnerProfileSource::new(&stub.base_url, TEST_SKEW).unwrap();
        let (refresher, gateway) = boot(Arc::new(source)).await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = refresher.spawn(shutdown_rx);

        stub.set_profiles(json!([profile("ak-1", "alpha"), profile("ak-3", "gamma")]));
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while gateway.registry.get("ak-3").is_none() {
            assert!(tokio::time::Instant::now() < deadline, "ak-3 never loaded");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(get_status(&gateway, "ak-3").await, 200);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_should_fail_boot_when_profile_service_is_down() {
        let stub = ProfileStub::start(json!([])).await;
        stub.fail_with(500);
        let source = PartnerProfileSource::new(&stub.base_url, TEST_SKEW).unwrap();
        let refresher = CredentialRefresher::new(
            Arc::new(source),
            Arc::new(CredentialRegistry::new()),
            Duration::from_secs(15),
        );
        assert!(refresher.load_initial().await.is_err());
    }

    #[tokio::test]
    async fn test_should_boot_from_credentials_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json!([profile("ak-file", "filed")])).unwrap();
        let source = FileCredentialSource::new(file.path(), TEST_SKEW);
        let (_refresher, gateway) = boot(Arc::new(source)).await;

        let resp = client()
            .get(gateway.url("/v1/transactions"))
            .header("X-Api-Key", "ak-file")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["partner_id"], "filed");
    }
}
