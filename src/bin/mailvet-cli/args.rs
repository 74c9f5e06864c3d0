use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use mailvet::{EngineConfig, Tier, ValidateOptions};

#[derive(Parser)]
#[command(name = "mailvet-cli", version, about = "Validation et vérification d'adresses e-mail")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,

    #[command(flatten)]
    pub net: NetworkArgs,
}

/// réglages réseau communs aux sous-commandes
#[derive(Args)]
pub struct NetworkArgs {
    /// timeout DNS par requête (ms, ramené entre 2000 et 5000)
    #[arg(long, global = true, env = "MAILVET_DNS_TIMEOUT_MS", default_value_t = 3_000)]
    pub dns_timeout_ms: u64,

    /// timeout SMTP par commande (ms), le triple par hôte
    #[arg(long, global = true, env = "MAILVET_SMTP_TIMEOUT_MS", default_value_t = 7_000)]
    pub smtp_timeout_ms: u64,

    /// nom annoncé en EHLO/HELO
    #[arg(long, global = true, env = "MAILVET_HELO")]
    pub helo: Option<String>,

    /// enveloppe MAIL FROM (expéditeur nul `<>` par défaut)
    #[arg(long, global = true, env = "MAILVET_MAIL_FROM")]
    pub mail_from: Option<String>,

    /// port SMTP des MX
    #[arg(long, global = true, env = "MAILVET_SMTP_PORT", default_value_t = 25)]
    pub port: u16,

    /// durée de vie du cache de domaines (s)
    #[arg(long, global = true, env = "MAILVET_CACHE_TTL_SECS", default_value_t = 3_600)]
    pub cache_ttl_secs: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// valide une adresse
    Validate {
        email: String,
        /// lance la sonde SMTP (tier HIGH uniquement)
        #[arg(long)]
        smtp: bool,
        /// force le tier: low|medium|high
        #[arg(long)]
        tier: Option<Tier>,
        /// désactive l'analyse de motifs de la partie locale
        #[arg(long)]
        no_advanced: bool,
        /// format: human|json
        #[arg(long, default_value = "human")]
        format: String,
    },
    /// valide une liste d'adresses (une par ligne) en flux
    Batch {
        /// fichier d'entrée
        #[arg(long, conflicts_with = "stdin", required_unless_present = "stdin")]
        file: Option<PathBuf>,
        /// lit les adresses depuis stdin
        #[arg(long)]
        stdin: bool,
        /// lance la sonde SMTP (lots en mode complet uniquement)
        #[arg(long)]
        smtp: bool,
        /// nombre de workers
        #[arg(long, env = "MAILVET_WORKERS")]
        workers: Option<usize>,
        /// désactive l'analyse de motifs de la partie locale
        #[arg(long)]
        no_advanced: bool,
        /// format: human|ndjson|csv
        #[arg(long, default_value = "human")]
        format: String,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.dns.timeout = Duration::from_millis(self.net.dns_timeout_ms);
        config.dns.cache_ttl = Duration::from_secs(self.net.cache_ttl_secs);
        config.smtp = config
            .smtp
            .with_timeout(Duration::from_millis(self.net.smtp_timeout_ms));
        config.smtp.port = self.net.port;
        config.smtp.helo_domain = self.net.helo.clone();
        config.smtp.mail_from = self.net.mail_from.clone();
        if let Commands::Batch {
            workers: Some(workers),
            ..
        } = self.cmd
        {
            config.batch.workers = workers.max(1);
        }
        config
    }
}

pub fn validate_options(smtp: bool, tier: Option<Tier>, no_advanced: bool) -> ValidateOptions {
    ValidateOptions {
        enable_smtp: smtp,
        advanced: !no_advanced,
        tier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_land_in_the_engine_config() {
        let cli = Cli::try_parse_from([
            "mailvet-cli",
            "--dns-timeout-ms",
            "4000",
            "--helo",
            "probe.acme.io",
            "batch",
            "--stdin",
            "--workers",
            "3",
        ])
        .expect("parse");
        let config = cli.engine_config();
        assert_eq!(config.dns.timeout, Duration::from_secs(4));
        assert_eq!(config.smtp.helo_domain.as_deref(), Some("probe.acme.io"));
        assert_eq!(config.batch.workers, 3);
        assert_eq!(config.smtp.port, 25);
    }

    #[test]
    fn tier_is_parsed_case_insensitively() {
        let cli = Cli::try_parse_from(["mailvet-cli", "validate", "a@b.io", "--tier", "High"])
            .expect("parse");
        let Commands::Validate { tier, .. } = cli.cmd else {
            panic!("validate expected");
        };
        assert_eq!(tier, Some(Tier::High));
    }

    #[test]
    fn batch_needs_an_input() {
        assert!(Cli::try_parse_from(["mailvet-cli", "batch"]).is_err());
        assert!(
            Cli::try_parse_from(["mailvet-cli", "batch", "--stdin", "--file", "x.txt"]).is_err()
        );
    }
}
