use clap::{Arg, Command};

pub const ARG_MAIL_ENDPOINT: &str = "mail-endpoint";
pub const ARG_MAIL_API_KEY: &str = "mail-api-key";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MAIL_ENDPOINT)
                .long("mail-endpoint")
                .help("HTTP mail endpoint; omit to log emails instead of sending")
                .env("DEMANDO_MAIL_ENDPOINT"),
        )
        .arg(
            Arg::new(ARG_MAIL_API_KEY)
                .long("mail-api-key")
                .help("Bearer token for the mail endpoint")
                .env("DEMANDO_MAIL_API_KEY"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mail_args_are_optional() {
        let command = with_args(Command::new("demando"));
        let matches = command.get_matches_from(vec!["demando"]);
        assert_eq!(matches.get_one::<String>(ARG_MAIL_ENDPOINT), None);
        assert_eq!(matches.get_one::<String>(ARG_MAIL_API_KEY), None);
    }
}
