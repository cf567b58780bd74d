use clap::{Args, Parser, Subcommand};
use colored_json::{Color, ColorMode, Output, Styler, ToColoredJson};
use serde::Serialize;
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use ump_consent::addtl::AdditionalConsent;
use ump_consent::config::ConsentConfig;
use ump_consent::expiry::{EncodedTimestamp, now_millis};
use ump_consent::signals::ConsentSignals;
use ump_consent::status::{ConsentStatus, Platform};
use ump_consent::storage::{
    ADDTL_CONSENT, ConsentStorageMut, GDPR_APPLIES, MemoryStorage, PURPOSE_CONSENTS,
    PURPOSE_LEGITIMATE_INTERESTS, VENDOR_CONSENTS, VENDOR_LEGITIMATE_INTERESTS,
    publish_tc_string,
};
use ump_consent::tcstring::TcHeader;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log debug information to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate consent decisions for a set of IABTCF_* values
    Evaluate(EvaluateArgs),
    /// Check whether a TC string is outdated
    Expiry {
        /// TC string to check
        tc_string: String,
        /// Current time in milliseconds since the Unix epoch
        #[arg(short, long)]
        now: Option<i64>,
    },
    /// Decode the core segment of a TC string
    Header {
        /// TC string to decode
        tc_string: String,
    },
    /// Parse an additional consent string
    Addtl {
        /// Additional consent string to parse
        addtl_consent: String,
    },
    /// Map native consent status codes
    Status {
        /// Platform whose codes are mapped (android or ios)
        #[arg(short, long)]
        platform: Option<Platform>,
        /// Status code to map
        code: Option<i64>,
    },
}

#[derive(Args)]
struct EvaluateArgs {
    /// JSON file mapping IABTCF_* keys to values
    #[arg(short, long)]
    storage: Option<PathBuf>,
    /// Value of IABTCF_gdprApplies
    #[arg(long)]
    gdpr_applies: Option<i64>,
    /// Value of IABTCF_PurposeConsents
    #[arg(long)]
    purpose_consents: Option<String>,
    /// Value of IABTCF_PurposeLegitimateInterests
    #[arg(long)]
    purpose_legitimate_interests: Option<String>,
    /// Value of IABTCF_VendorConsents
    #[arg(long)]
    vendor_consents: Option<String>,
    /// Value of IABTCF_VendorLegitimateInterests
    #[arg(long)]
    vendor_legitimate_interests: Option<String>,
    /// Value of IABTCF_AddtlConsent
    #[arg(long)]
    addtl_consent: Option<String>,
    /// TC string, from which the bitstrings are derived
    #[arg(long)]
    tc_string: Option<String>,
    /// Vendor to evaluate, defaults to the configured Google vendor id
    #[arg(long)]
    vendor_id: Option<u16>,
    /// Current time in milliseconds since the Unix epoch
    #[arg(short, long)]
    now: Option<i64>,
}

fn main() {
    let args = Cli::parse();

    init_logging(args.verbose);

    let e = load_config(args.config.as_deref()).and_then(|config| match args.cmd {
        Commands::Evaluate(evaluate) => evaluate_signals(&config, evaluate),
        Commands::Expiry { tc_string, now } => check_expiry(&config, &tc_string, now),
        Commands::Header { tc_string } => decode_header(&tc_string),
        Commands::Addtl { addtl_consent } => parse_addtl_consent(&addtl_consent),
        Commands::Status { platform, code } => map_status(platform, code),
    });

    if let Err(e) = e {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ConsentConfig> {
    let Some(path) = path else {
        return Ok(ConsentConfig::default());
    };

    let f = File::open(path)?;
    let config = serde_json::from_reader(f)?;
    tracing::debug!(?config, "loaded configuration");

    Ok(config)
}

fn evaluate_signals(config: &ConsentConfig, args: EvaluateArgs) -> Result<()> {
    let mut storage = match &args.storage {
        Some(path) => serde_json::from_reader(File::open(path)?)?,
        None => MemoryStorage::new(),
    };

    if let Some(tc_string) = &args.tc_string {
        publish_tc_string(&mut storage, tc_string)?;
    }
    if let Some(gdpr_applies) = args.gdpr_applies {
        storage.set_int(GDPR_APPLIES, gdpr_applies);
    }

    for (key, value) in [
        (PURPOSE_CONSENTS, args.purpose_consents),
        (PURPOSE_LEGITIMATE_INTERESTS, args.purpose_legitimate_interests),
        (VENDOR_CONSENTS, args.vendor_consents),
        (VENDOR_LEGITIMATE_INTERESTS, args.vendor_legitimate_interests),
        (ADDTL_CONSENT, args.addtl_consent),
    ] {
        if let Some(value) = value {
            storage.set_string(key, value);
        }
    }

    let signals = ConsentSignals::load(&storage);
    let decisions = signals.decisions(
        args.vendor_id.unwrap_or(config.google_vendor_id),
        &config.expiry,
        args.now.unwrap_or_else(now_millis),
    );

    print_json(&decisions)
}

#[derive(Serialize)]
struct ExpiryReport {
    created: EncodedTimestamp,
    now: i64,
    age_days: i64,
    max_age_days: i64,
    expired: bool,
}

fn check_expiry(config: &ConsentConfig, tc_string: &str, now: Option<i64>) -> Result<()> {
    let now = now.unwrap_or_else(now_millis);

    let report = ExpiryReport {
        created: EncodedTimestamp::from_tc_string(tc_string, config.expiry.unknown_chars),
        now,
        age_days: config.expiry.age_in_days(tc_string, now),
        max_age_days: config.expiry.max_age_days,
        expired: config.expiry.is_expired(tc_string, now),
    };

    print_json(&report)
}

fn decode_header(tc_string: &str) -> Result<()> {
    let header = TcHeader::from_str(tc_string)?;

    print_json(&header)
}

fn parse_addtl_consent(s: &str) -> Result<()> {
    let ac = AdditionalConsent::from_str(s)?;

    print_json(&ac)
}

#[derive(Serialize)]
struct StatusCode {
    platform: Platform,
    code: i64,
    status: ConsentStatus,
}

fn map_status(platform: Option<Platform>, code: Option<i64>) -> Result<()> {
    let platforms = match platform {
        Some(p) => vec![p],
        None => vec![Platform::Android, Platform::Ios],
    };

    let codes = platforms
        .into_iter()
        .flat_map(|platform| match code {
            Some(code) => vec![StatusCode {
                platform,
                code,
                status: ConsentStatus::from_code(platform, code),
            }],
            None => ConsentStatus::ALL
                .into_iter()
                .map(|status| StatusCode {
                    platform,
                    code: status.code(platform),
                    status,
                })
                .collect(),
        })
        .collect::<Vec<_>>();

    print_json(&codes)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value)?
            .to_colored_json_with_styler(ColorMode::Auto(Output::StdOut), json_color_styler())?
    );

    Ok(())
}

fn json_color_styler() -> Styler {
    Styler {
        key: Color::Green.foreground(),
        string_value: Color::Blue.bold(),
        integer_value: Color::Magenta.bold(),
        float_value: Color::Magenta.italic(),
        object_brackets: Color::Yellow.bold(),
        array_brackets: Color::Cyan.bold(),
        ..Default::default()
    }
}
