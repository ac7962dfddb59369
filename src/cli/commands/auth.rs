use clap::{Arg, Command, builder::ValueParser};

pub const ARG_SECRET: &str = "secret";
pub const ARG_PUBLIC_BASE_URL: &str = "public-base-url";
pub const ARG_ACCESS_TTL: &str = "access-ttl";
pub const ARG_REFRESH_TTL: &str = "refresh-ttl";
pub const ARG_VERIFICATION_TTL: &str = "verification-ttl";
pub const ARG_RESET_TTL: &str = "reset-ttl";
pub const ARG_RATE_LIMIT_SWEEP_SECONDS: &str = "rate-limit-sweep-seconds";

/// Parse `<number><s|m|h|d>` TTL strings into seconds.
fn parse_ttl(value: &str) -> Result<u64, String> {
    let value = value.trim();
    let mut chars = value.chars();
    let unit = chars
        .next_back()
        .ok_or_else(|| "expected <number><s|m|h|d>, e.g. 15m or 7d".to_string())?;
    let number = chars.as_str();
    let multiplier: u64 = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return Err("expected <number><s|m|h|d>, e.g. 15m or 7d".to_string()),
    };
    let number: u64 = number
        .parse()
        .map_err(|_| "expected <number><s|m|h|d>, e.g. 15m or 7d".to_string())?;
    if number == 0 {
        return Err("TTL must be positive".to_string());
    }
    number
        .checked_mul(multiplier)
        .ok_or_else(|| "TTL overflows".to_string())
}

#[must_use]
pub fn validator_ttl() -> ValueParser {
    ValueParser::from(move |value: &str| -> std::result::Result<u64, String> { parse_ttl(value) })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SECRET)
                .long("secret")
                .help("Token signing secret (HMAC-SHA256)")
                .env("DEMANDO_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PUBLIC_BASE_URL)
                .long("public-base-url")
                .help("Public base URL used for email links and CORS")
                .env("DEMANDO_PUBLIC_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_ACCESS_TTL)
                .long("access-ttl")
                .help("Access token lifetime, <number><s|m|h|d>")
                .env("DEMANDO_ACCESS_TTL")
                .default_value("15m")
                .value_parser(validator_ttl()),
        )
        .arg(
            Arg::new(ARG_REFRESH_TTL)
                .long("refresh-ttl")
                .help("Refresh token lifetime, <number><s|m|h|d>")
                .env("DEMANDO_REFRESH_TTL")
                .default_value("7d")
                .value_parser(validator_ttl()),
        )
        .arg(
            Arg::new(ARG_VERIFICATION_TTL)
                .long("verification-ttl")
                .help("Email verification token lifetime, <number><s|m|h|d>")
                .env("DEMANDO_VERIFICATION_TTL")
                .default_value("24h")
                .value_parser(validator_ttl()),
        )
        .arg(
            Arg::new(ARG_RESET_TTL)
                .long("reset-ttl")
                .help("Password reset token lifetime, <number><s|m|h|d>")
                .env("DEMANDO_RESET_TTL")
                .default_value("1h")
                .value_parser(validator_ttl()),
        )
        .arg(
            Arg::new(ARG_RATE_LIMIT_SWEEP_SECONDS)
                .long("rate-limit-sweep-seconds")
                .help("How often to sweep expired rate-limit windows")
                .env("DEMANDO_RATE_LIMIT_SWEEP_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ttl_accepts_all_units() {
        assert_eq!(parse_ttl("45s"), Ok(45));
        assert_eq!(parse_ttl("15m"), Ok(15 * 60));
        assert_eq!(parse_ttl("24h"), Ok(24 * 60 * 60));
        assert_eq!(parse_ttl("7d"), Ok(7 * 24 * 60 * 60));
    }

    #[test]
    fn parse_ttl_rejects_malformed_values() {
        assert!(parse_ttl("").is_err());
        assert!(parse_ttl("15").is_err());
        assert!(parse_ttl("m").is_err());
        assert!(parse_ttl("15 m").is_err());
        assert!(parse_ttl("-3m").is_err());
        assert!(parse_ttl("0d").is_err());
        assert!(parse_ttl("15w").is_err());
    }
}
