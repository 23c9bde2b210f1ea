use clap::{Parser, Subcommand};
use merchant_tariffs::application::Services;
use merchant_tariffs::application::messages::MessageRegistry;
use merchant_tariffs::application::onboarding::TariffRatesQuery;
use merchant_tariffs::application::system_fees::FeeLookupRequest;
use merchant_tariffs::config::Settings;
use merchant_tariffs::domain::fees::CardBrand;
use merchant_tariffs::domain::notification::StatusTitles;
use merchant_tariffs::infrastructure::in_memory::in_memory_backends;
use merchant_tariffs::interfaces::csv::tariff_writer::TariffWriter;
use merchant_tariffs::interfaces::json::reference_data::ReferenceData;
use miette::{IntoDiagnostic, Result, miette};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML or JSON), overridden by MERCHANT_TARIFFS_* variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the payment tiers of the tariffs matching a query
    Tariffs {
        /// Reference data JSON file
        data: PathBuf,
        #[arg(long)]
        region: String,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        from: Option<Decimal>,
        #[arg(long)]
        to: Option<Decimal>,
    },
    /// Print the system fee tier applied to a payment
    Fee {
        /// Reference data JSON file
        data: PathBuf,
        #[arg(long)]
        method: String,
        #[arg(long)]
        region: String,
        #[arg(long)]
        brand: Option<CardBrand>,
        #[arg(long)]
        currency: String,
        #[arg(long)]
        amount: Decimal,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).into_diagnostic()?;

    let backends = in_memory_backends();
    let services = Services::new(
        backends.clone(),
        &settings,
        Arc::new(MessageRegistry::default()),
        Arc::new(StatusTitles::default()),
    );

    let data = match &cli.command {
        Command::Tariffs { data, .. } | Command::Fee { data, .. } => data,
    };
    let reference = ReferenceData::from_reader(File::open(data).into_diagnostic()?).into_diagnostic()?;
    reference
        .seed(&backends, &services.system_fees)
        .await
        .into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = TariffWriter::new(stdout.lock());

    match cli.command {
        Command::Tariffs {
            region,
            currency,
            from,
            to,
            ..
        } => {
            let rsp = services
                .onboarding
                .get_merchant_tariff_rates(TariffRatesQuery {
                    region,
                    payout_currency: currency,
                    amount_from: from,
                    amount_to: to,
                })
                .await;
            match (rsp.item, rsp.message) {
                (Some(templates), _) => writer.write_payment_tiers(&templates).into_diagnostic()?,
                (None, Some(message)) => {
                    return Err(miette!("{} ({})", message.message, message.code));
                }
                (None, None) => return Err(miette!("tariff lookup returned nothing")),
            }
        }
        Command::Fee {
            method,
            region,
            brand,
            currency,
            amount,
            ..
        } => {
            let fee = services
                .system_fees
                .get_system_fees_for_payment(&FeeLookupRequest {
                    method_id: method,
                    region,
                    card_brand: brand,
                    currency,
                    amount,
                })
                .await
                .into_diagnostic()?;
            writer.write_matched_fee(&fee).into_diagnostic()?;
        }
    }

    Ok(())
}
