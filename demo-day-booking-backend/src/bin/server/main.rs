mod telemetry;

use demo_day_booking_backend::error::AppError;
use demo_day_booking_backend::run_server;
use demo_day_booking_config::get_config;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // avoid putting more code here as this is outside of all spans so doesn't get traced
    telemetry::setup_telemetry();

    let config = get_config()?;
    run_server(config).await?.await
}
