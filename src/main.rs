use anyhow::Context;
use clap::Parser;
use slot_verifier::config::toml_config::{SOURCE_FIXTURE, SOURCE_SHEETS};
use slot_verifier::core::rag_context::ContextFilter;
use slot_verifier::core::directory::DoctorDirectory;
use slot_verifier::utils::error::ErrorSeverity;
use slot_verifier::utils::{logger, validation::Validate};
use slot_verifier::{
    AppointmentRequest, CliConfig, Command, MemoryStore, ScheduleStore, SheetsStore,
    VerifierConfig, VerifierError,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting slot-verifier");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match VerifierConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = execute(&cli.command, &config).await {
        let exit_code = match e.downcast_ref::<VerifierError>() {
            Some(err) => {
                tracing::error!(
                    "❌ {:#} (Category: {:?}, Severity: {:?})",
                    e,
                    err.category(),
                    err.severity()
                );
                eprintln!("❌ {}", err.user_friendly_message());
                eprintln!("💡 {}", err.recovery_suggestion());
                match err.severity() {
                    ErrorSeverity::Low => 0,
                    ErrorSeverity::Medium => 2,
                    ErrorSeverity::High => 1,
                    ErrorSeverity::Critical => 3,
                }
            }
            None => {
                tracing::error!("❌ {:#}", e);
                eprintln!("❌ {:#}", e);
                1
            }
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn execute(command: &Command, config: &VerifierConfig) -> anyhow::Result<()> {
    if let Command::CheckConfig = command {
        display_config_summary(config);
        return Ok(());
    }

    match config.source.r#type.as_str() {
        SOURCE_FIXTURE => {
            let (roster_csv, grid_json) = config.fixture_paths()?;
            let store = MemoryStore::from_fixture_files(roster_csv, grid_json)
                .with_context(|| format!("loading fixture {} / {}", roster_csv, grid_json))?;
            run(store, command, config).await
        }
        SOURCE_SHEETS => {
            let store = SheetsStore::new(config.sheets_settings()?)?;
            run(store, command, config).await
        }
        other => anyhow::bail!("unsupported source type '{}'", other),
    }
}

async fn run<S: ScheduleStore>(store: S, command: &Command, config: &VerifierConfig) -> anyhow::Result<()> {
    let verifier = config.build_verifier(store)?;

    match command {
        Command::Verify { request, .. } => {
            let request = match request {
                Some(path) => read_request(path)?,
                None => command.request_from_flags().unwrap_or_default(),
            };
            let verdict = verifier.verify(&request).await?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        Command::Context { name, specialty } => {
            let filter = ContextFilter {
                name: name.clone(),
                specialty: specialty.clone(),
            };
            let context = verifier
                .context_builder()
                .build(verifier.store(), &filter)
                .await?;
            println!("{}", context);
        }
        Command::Day { doctor } => {
            let directory = DoctorDirectory::load(verifier.store()).await?;
            let matched: Vec<_> = directory.find_by_name(doctor).into_iter().take(1).collect();
            let name = matched.first().map(|d| d.name.as_str()).unwrap_or(doctor.as_str());

            match verifier.grid().day_schedule(name, &matched).await? {
                Some(day) => {
                    println!("{}", name);
                    for (hour, status) in day {
                        println!("{:>2}:00  {}", hour, status);
                    }
                }
                None => println!("doctor {} not found in the schedule grid", name),
            }
        }
        Command::CheckConfig => display_config_summary(config),
    }

    Ok(())
}

fn read_request(path: &str) -> anyhow::Result<AppointmentRequest> {
    let content = if path == "-" {
        std::io::read_to_string(std::io::stdin()).context("reading request from stdin")?
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading request file {}", path))?
    };
    let request = serde_json::from_str(&content).map_err(VerifierError::from)?;
    Ok(request)
}

fn display_config_summary(config: &VerifierConfig) {
    let addressing = config.addressing();
    let classifier = config.classifier();
    println!("✅ Configuration is valid");
    println!("   Source:    {}", config.source.r#type);
    println!(
        "   Hours:     {}:00-{}:00",
        addressing.start_hour, addressing.end_hour
    );
    println!("   Tolerance: {}", classifier.tolerance);
    match config.clarifier_settings() {
        Some(settings) => println!("   Clarifier: {} at {}", settings.model, settings.endpoint),
        None => println!("   Clarifier: disabled"),
    }
}
