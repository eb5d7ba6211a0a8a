// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub payment_webhook_secret: String,
    pub payout_export_dir: String,
    pub payout_schedule_enabled: bool,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let payment_webhook_secret =
            std::env::var("PAYMENT_WEBHOOK_SECRET").expect("PAYMENT_WEBHOOK_SECRET must be set");

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8000);

        let payout_export_dir = std::env::var("PAYOUT_EXPORT_DIR")
            .unwrap_or_else(|_| "exports/payouts".to_string());

        let payout_schedule_enabled = std::env::var("PAYOUT_SCHEDULE_ENABLED")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        Config {
            database_url,
            jwt_secret,
            port,
            payment_webhook_secret,
            payout_export_dir,
            payout_schedule_enabled,
        }
    }
}
