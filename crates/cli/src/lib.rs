use anyhow::{Context as AnyhowContext, Result};
use axum::{
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use clap::{Args, Parser, Subcommand};
use command::{CommandHandler, CommandRequest, CommandResponse, ResponseMeta, SuggestOutput};
use config::AppConfig;
use server_security::{BearerToken, ServePlan};
use diacare_engine::{ClinicalField, Engine, EngineError, RawClinicalInput, RiskResult};
use diacare_protocol::{codes, serialize_json};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod command;
mod config;
mod http_api;
mod prompt;
mod report;
mod server_security;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serialize_json(value)?
    };
    print_stdout(&output)
}

#[derive(Parser)]
#[command(name = "diacare")]
#[command(about = "Diabetes risk scoring and drug recommendations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Config file, JSON or TOML (env: DIACARE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Artifact directory (env: DIACARE_ARTIFACT_DIR)
    #[arg(long, global = true)]
    artifact_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify diabetes risk from clinical measurements
    Predict(PredictArgs),

    /// Recommend drugs similar to a catalog drug
    Recommend(RecommendArgs),

    /// List catalog drug names starting with a prefix
    Suggest(SuggestArgs),

    /// Execute a JSON Command API request
    Command(CommandArgs),

    /// Serve Command API over HTTP (POST /command)
    ServeHttp(ServeArgs),

    /// Load every artifact and report what was found
    Doctor(DoctorArgs),
}

#[derive(Args)]
struct PredictArgs {
    #[arg(long)]
    pregnancies: Option<f64>,

    #[arg(long)]
    glucose: Option<f64>,

    #[arg(long)]
    blood_pressure: Option<f64>,

    #[arg(long)]
    skin_thickness: Option<f64>,

    #[arg(long)]
    insulin: Option<f64>,

    #[arg(long)]
    bmi: Option<f64>,

    #[arg(long, visible_alias = "dpf")]
    diabetes_pedigree_function: Option<f64>,

    #[arg(long)]
    age: Option<f64>,

    /// JSON file with the clinical fields ("-" reads stdin); flags override it
    #[arg(long)]
    input: Option<PathBuf>,

    /// Print every feature with its raw and scaled value
    #[arg(long)]
    explain: bool,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

impl PredictArgs {
    fn flag_values(&self) -> [(ClinicalField, Option<f64>); 8] {
        [
            (ClinicalField::Pregnancies, self.pregnancies),
            (ClinicalField::Glucose, self.glucose),
            (ClinicalField::BloodPressure, self.blood_pressure),
            (ClinicalField::SkinThickness, self.skin_thickness),
            (ClinicalField::Insulin, self.insulin),
            (ClinicalField::Bmi, self.bmi),
            (
                ClinicalField::DiabetesPedigreeFunction,
                self.diabetes_pedigree_function,
            ),
            (ClinicalField::Age, self.age),
        ]
    }
}

#[derive(Args)]
struct RecommendArgs {
    /// Exact catalog drug name
    name: String,

    /// Maximum number of recommendations (default from config)
    #[arg(long, short = 'n')]
    limit: Option<usize>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SuggestArgs {
    /// Name prefix (case-insensitive)
    #[arg(default_value = "")]
    query: String,

    /// Show at most this many names
    #[arg(long, short = 'n')]
    limit: Option<usize>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CommandArgs {
    /// Inline JSON payload (mutually exclusive with --file)
    #[arg(long, conflicts_with = "file")]
    json: Option<String>,

    /// Path to file containing JSON payload
    #[arg(long)]
    file: Option<PathBuf>,

    /// Pretty-print JSON response
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address (default: server.bind from config, else 127.0.0.1:7700)
    #[arg(long)]
    bind: Option<String>,

    /// Allow binding to non-loopback addresses (requires --auth-token)
    #[arg(long)]
    public: bool,

    /// Require Authorization: Bearer <token> on all requests (env: DIACARE_AUTH_TOKEN)
    #[arg(long)]
    auth_token: Option<String>,
}

#[derive(Args)]
struct DoctorArgs {
    /// Output JSON format
    #[arg(long)]
    json: bool,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // stdout stays clean for JSON output
    let json_output = match &cli.command {
        Commands::Predict(args) => args.json,
        Commands::Recommend(args) => args.json,
        Commands::Suggest(args) => args.json,
        Commands::Command(_) => true,
        Commands::Doctor(args) => args.json,
        Commands::ServeHttp(_) => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = AppConfig::resolve(cli.config.as_deref(), cli.artifact_dir.as_deref())?;

    match cli.command {
        Commands::Predict(args) => run_predict(args, &config).await?,
        Commands::Recommend(args) => run_recommend(args, &config).await?,
        Commands::Suggest(args) => run_suggest(args, &config).await?,
        Commands::Command(args) => run_command(args, &config).await?,
        Commands::ServeHttp(args) => serve_http(args, &config).await?,
        Commands::Doctor(args) => run_doctor(args, &config).await?,
    }

    Ok(())
}

async fn run_doctor(args: DoctorArgs, config: &AppConfig) -> Result<()> {
    let report = report::doctor(config).await;

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&report)?)?;
    } else {
        for line in report::render_human(&report) {
            eprintln!("{line}");
        }
    }

    if !report.ok {
        std::process::exit(1);
    }

    Ok(())
}

async fn load_engine(config: &AppConfig) -> Result<Engine> {
    Engine::load(&config.engine_config()).await.with_context(|| {
        format!(
            "Failed to load artifacts from {} (run `diacare doctor`)",
            config.artifact_dir.display()
        )
    })
}

#[derive(Serialize)]
struct PredictOutput {
    #[serde(flatten)]
    result: RiskResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    features: Option<Vec<command::FeatureExplanation>>,
}

async fn run_predict(args: PredictArgs, config: &AppConfig) -> Result<()> {
    let mut raw = match &args.input {
        Some(path) => read_clinical_input(path)?,
        None => RawClinicalInput::default(),
    };
    for (field, value) in args.flag_values() {
        if let Some(value) = value {
            raw.set(field, value);
        }
    }
    let reads_stdin = args.input.as_deref() == Some(Path::new("-"));
    if !args.json && !reads_stdin && prompt::stdin_is_interactive() {
        prompt::fill_missing(&mut raw)?;
    }

    let engine = load_engine(config).await?;
    let features = engine.features(&raw)?;
    let result = engine.predict_features(&features)?;
    let features = args
        .explain
        .then(|| command::explain(&engine, &features));

    if args.json {
        return print_json(&PredictOutput { result, features }, false);
    }

    if let Some(features) = &features {
        print_stdout("Features:")?;
        for feature in features {
            print_stdout(&format!(
                "  {:<26} {:>10.3}  scaled {:>10.4}",
                feature.name, feature.value, feature.scaled
            ))?;
        }
        print_stdout("")?;
    }
    print_stdout(&format!("Prediction: {}", result.label))?;
    print_stdout(&format!(
        "Probability of Negative: {:.2}",
        result.probability_negative
    ))?;
    print_stdout(&format!(
        "Probability of Positive: {:.2}",
        result.probability_positive
    ))?;
    Ok(())
}

fn read_clinical_input(path: &Path) -> Result<RawClinicalInput> {
    let raw = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read clinical input from stdin")?;
        buffer
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read clinical input from {}", path.display()))?
    };
    serde_json::from_str(&raw).context("Clinical input must be a JSON object of fields")
}

async fn run_recommend(args: RecommendArgs, config: &AppConfig) -> Result<()> {
    let engine = load_engine(config).await?;
    let limit = args.limit.unwrap_or(engine.options().recommend_limit);
    let recommendations = match engine.recommend_with_limit(&args.name, limit) {
        Ok(recommendations) => recommendations,
        Err(err @ EngineError::NotFound { .. }) => {
            let suggestions =
                engine.closest_names(&args.name, command::domain::SUGGESTION_HINT_LIMIT);
            if suggestions.is_empty() {
                anyhow::bail!("{err}");
            }
            anyhow::bail!("{err}. Did you mean: {}?", suggestions.join(", "));
        }
        Err(err) => return Err(err.into()),
    };

    if args.json {
        return print_json(
            &serde_json::json!({ "name": args.name, "recommendations": recommendations }),
            false,
        );
    }

    if recommendations.is_empty() {
        print_stdout(&format!("No recommendations for '{}'", args.name))?;
        return Ok(());
    }
    print_stdout(&format!("Recommendations for '{}':", args.name))?;
    for (rank, rec) in recommendations.iter().enumerate() {
        print_stdout(&format!(
            "{}. {} (similarity {:.3})",
            rank + 1,
            rec.record.name,
            rec.score
        ))?;
        print_stdout(&format!("   Description: {}", rec.record.description))?;
        print_stdout(&format!("   Side Effects: {}", rec.record.side_effects))?;
        print_stdout(&format!("   How to use with: {}", rec.record.usage_notes))?;
    }
    Ok(())
}

async fn run_suggest(args: SuggestArgs, config: &AppConfig) -> Result<()> {
    let engine = load_engine(config).await?;
    let mut names = engine.suggest(&args.query);
    let total = names.len();
    if let Some(limit) = args.limit {
        names.truncate(limit);
    }

    if args.json {
        return print_json(
            &SuggestOutput {
                query: args.query,
                names,
                total,
            },
            false,
        );
    }

    for name in &names {
        print_stdout(name)?;
    }
    if names.len() < total {
        eprintln!("... {} more (raise --limit to see them)", total - names.len());
    }
    Ok(())
}

async fn run_command(args: CommandArgs, config: &AppConfig) -> Result<()> {
    let raw = read_payload(&args)?;
    let response = match serde_json::from_str::<CommandRequest>(&raw) {
        Ok(request) => match Engine::load(&config.engine_config()).await {
            Ok(engine) => CommandHandler::new(engine).execute(request),
            Err(err) => {
                log::error!("{err:#}");
                CommandResponse::error(
                    command::classify_error(&err, &[]),
                    ResponseMeta::default(),
                )
            }
        },
        Err(err) => http_api::error_response(
            codes::INVALID_REQUEST,
            format!("Invalid JSON passed to --json/--file: {err}"),
        ),
    };

    print_json(&response, args.pretty)?;

    if response.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

fn read_payload(args: &CommandArgs) -> Result<String> {
    if let Some(raw) = &args.json {
        return Ok(raw.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON from {}", path.display()));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read JSON from stdin")?;

    if buffer.trim().is_empty() {
        anyhow::bail!("Command request is empty. Provide --json, --file, or pipe JSON via stdin.");
    }

    Ok(buffer)
}

async fn serve_http(args: ServeArgs, config: &AppConfig) -> Result<()> {
    let plan = ServePlan::resolve(
        config,
        args.bind.as_deref(),
        args.auth_token.as_deref(),
        args.public,
    )
    .await?;

    let engine = load_engine(config).await?;
    let state = Arc::new(HttpState {
        handler: CommandHandler::new(engine),
        auth_token: plan.token,
    });
    let app = Router::new()
        .route(
            "/command",
            post({
                let state = state.clone();
                move |headers, body| http_handler(headers, body, state.clone())
            }),
        )
        .route(
            "/health",
            get({
                let state = state.clone();
                move |headers| http_health(headers, state.clone())
            }),
        );

    let listener = tokio::net::TcpListener::bind(plan.bind.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", plan.bind))?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!("Serving Command API: {base_url}/command"))?;
    print_stdout(&format!("Health endpoint: {base_url}/health"))?;

    if state.auth_token.is_some() {
        print_stdout("Auth enabled: send 'Authorization: Bearer <token>' with every request")?;
    }
    if plan.public {
        let addrs = plan
            .addrs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        print_stdout(&format!(
            "Public bind enabled (--public). Resolved addresses: {addrs}"
        ))?;
    }

    print_stdout(&format!("Try: curl {base_url}/health"))?;
    print_stdout(&format!(
        "Try: curl -X POST {base_url}/command -H 'Content-Type: application/json' -d '{{\"action\":\"capabilities\"}}'"
    ))?;
    axum::serve(listener, app).await?;
    Ok(())
}

struct HttpState {
    handler: CommandHandler,
    auth_token: Option<BearerToken>,
}

async fn http_handler(
    headers: HeaderMap,
    body: axum::body::Bytes,
    state: Arc<HttpState>,
) -> Result<Response, StatusCode> {
    if let Some(token) = &state.auth_token {
        if !http_api::is_authorized(&headers, token) {
            return http_api::unauthorized();
        }
    }

    let request: CommandRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            let response = http_api::error_response(
                codes::INVALID_REQUEST,
                format!("Invalid JSON request: {err}"),
            );
            return http_api::build_response(StatusCode::BAD_REQUEST, &response);
        }
    };
    let response = state.handler.execute(request);
    http_api::build_response(StatusCode::OK, &response)
}

async fn http_health(
    headers: HeaderMap,
    state: Arc<HttpState>,
) -> Result<Response, StatusCode> {
    if let Some(token) = &state.auth_token {
        if !http_api::is_authorized(&headers, token) {
            return http_api::unauthorized();
        }
    }

    let engine = state.handler.engine();
    let body = serde_json::json!({
        "status": "ok",
        "catalog_size": engine.store().catalog().len(),
        "classifier": engine.store().classifier().kind(),
    });
    let bytes = serde_json::to_vec(&body).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    http_api::json_response(StatusCode::OK, bytes)
}
