/// Liveness probe. Sweep failures do not affect it: the process is healthy as
/// long as it can answer.
pub async fn health_check() -> &'static str {
    "healthy"
}
