use zentoria_api::routes::health::health_check;

#[tokio::test]
async fn health_returns_ok_envelope() {
    let resp = health_check().await;
    assert_eq!(resp.0.status_code, 200);
    assert_eq!(resp.0.message, "Health check");
}
