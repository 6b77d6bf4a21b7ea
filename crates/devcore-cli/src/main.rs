use std::env;
use std::error::Error;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use devcore_core::hydrate;
use devcore_core::persist;
use devcore_core::read_consent;
use devcore_core::write_consent;
use devcore_core::Action;
use devcore_core::Config;
use devcore_core::Consent;
use devcore_core::FeatureRegistry;
use devcore_core::FileStorage;
use devcore_core::RepoSelection;
use devcore_core::Store;
use devcore_core::StoreEffect;
use devcore_core::ViewId;
use devcore_exec::PromptTemplate;

const DEFAULT_LOG_FILTER: &str = "devcore=info,devcore_core=info,devcore_exec=info";

fn main() {
    init_tracing();
    if let Err(err) = run(env::args().skip(1).collect()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(args: Vec<String>) -> Result<(), Box<dyn Error>> {
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("devcore {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "features" => {
            let workspace = Workspace::open(load_config(None)?)?;
            print_features(&workspace, &rest.join(" "));
            Ok(())
        }
        "show" => {
            let workspace = Workspace::open(load_config(None)?)?;
            println!("{}", serde_json::to_string_pretty(&workspace.status())?);
            Ok(())
        }
        "navigate" => {
            let view = ViewId::new(single_arg(&rest, "navigate requires a view id")?);
            if !is_known_view(&view) {
                return Err(format!("unknown view: {}", view.as_str()).into());
            }
            let mut workspace = Workspace::open(load_config(None)?)?;
            workspace.apply(Action::Navigate {
                view,
                props: Default::default(),
            })?;
            println!("active view: {}", workspace.store.state().active_view);
            Ok(())
        }
        "toggle" => {
            let feature = single_arg(&rest, "toggle requires a feature id")?;
            if !FeatureRegistry::contains(&feature) {
                return Err(format!("unknown feature: {feature}").into());
            }
            let mut workspace = Workspace::open(load_config(None)?)?;
            workspace.apply(Action::toggle_feature(feature.as_str()))?;
            let state = if workspace.store.state().is_hidden(&feature) {
                "hidden"
            } else {
                "visible"
            };
            println!("{feature}: {state}");
            Ok(())
        }
        "select-repo" => {
            let target = single_arg(&rest, "select-repo requires owner/repo or none")?;
            let selection = parse_selection(target.as_str())?;
            let mut workspace = Workspace::open(load_config(None)?)?;
            workspace.apply(Action::SetSelectedRepo(selection))?;
            match &workspace.store.state().selected_repo {
                Some(repo) => println!("selected {}", repo.full_name()),
                None => println!("no repository selected"),
            }
            Ok(())
        }
        "logout" => {
            let mut workspace = Workspace::open(load_config(None)?)?;
            workspace.apply(Action::Logout)?;
            println!("signed out");
            Ok(())
        }
        "consent" => {
            let answer = single_arg(&rest, "consent requires grant or deny")?;
            let granted = match answer.as_str() {
                "grant" => true,
                "deny" => false,
                other => return Err(format!("unsupported consent answer: {other}").into()),
            };
            let workspace = Workspace::open(load_config(None)?)?;
            write_consent(&workspace.storage, granted)?;
            println!("persistence {}", if granted { "enabled" } else { "disabled" });
            Ok(())
        }
        "prompt" => {
            let Some((feature, input)) = rest.split_first() else {
                return Err("prompt requires a feature id and input".into());
            };
            let template = PromptTemplate::get(feature)
                .ok_or_else(|| format!("no prompt template for {feature}"))?;
            let config = load_config(None)?;
            let request = template.request(&input.join(" ")).configured(&config.model);
            println!("{}", serde_json::to_string_pretty(&request)?);
            Ok(())
        }
        _ => {
            print_help();
            Err(format!("unknown command: {command}").into())
        }
    }
}

fn single_arg(rest: &[String], missing: &str) -> Result<String, Box<dyn Error>> {
    match rest {
        [value] => Ok(value.trim().to_string()),
        [] => Err(missing.into()),
        _ => Err(format!("unexpected arguments: {}", rest[1..].join(" ")).into()),
    }
}

fn is_known_view(view: &ViewId) -> bool {
    view.is_chrome() || FeatureRegistry::contains(view.as_str())
}

fn parse_selection(target: &str) -> Result<Option<RepoSelection>, Box<dyn Error>> {
    if target == "none" {
        return Ok(None);
    }
    RepoSelection::parse(target)
        .map(Some)
        .ok_or_else(|| format!("expected owner/repo, got {target}").into())
}

fn config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit
        .or_else(|| env::var_os("DEVCORE_CONFIG").map(PathBuf::from))
        .or_else(|| dirs::config_dir().map(|dir| dir.join("devcore").join("config.toml")))
}

fn load_config(explicit: Option<PathBuf>) -> Result<Config, Box<dyn Error>> {
    let Some(path) = config_path(explicit) else {
        return Ok(Config::default());
    };
    read_config(&path)
}

fn read_config(path: &Path) -> Result<Config, Box<dyn Error>> {
    match fs::read_to_string(path) {
        Ok(raw) => {
            let config = toml::from_str(&raw)
                .map_err(|err| format!("invalid config {}: {err}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            Ok(config)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
        Err(err) => Err(err.into()),
    }
}

fn storage_dir(config: &Config) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(dir) = &config.persistence.storage_dir {
        return Ok(dir.clone());
    }
    dirs::data_dir()
        .map(|dir| dir.join("devcore"))
        .ok_or_else(|| "no data directory; set persistence.storage_dir".into())
}

/// One CLI invocation's view of the persisted store.
struct Workspace {
    config: Config,
    storage: FileStorage,
    consent: Consent,
    store: Store,
}

#[derive(Debug, Serialize)]
struct Status<'a> {
    active_view: &'a str,
    hidden_features: &'a [String],
    connected: bool,
    has_token: bool,
    selected_repo: Option<String>,
    consent: &'static str,
    storage_dir: String,
}

impl Workspace {
    fn open(config: Config) -> Result<Self, Box<dyn Error>> {
        let storage = FileStorage::open(storage_dir(&config)?)?;
        let consent = read_consent(&storage);
        let state = hydrate(&storage, consent, config.persistence.codec());
        Ok(Self {
            config,
            storage,
            consent,
            store: Store::new(state),
        })
    }

    /// Dispatches and writes through immediately; a one-shot process has
    /// nothing to debounce.
    fn apply(&mut self, action: Action) -> Result<(), Box<dyn Error>> {
        let effects = self.store.dispatch(action);
        for effect in &effects {
            match effect {
                StoreEffect::PersistSnapshot if self.consent.allows_persistence() => {
                    persist(&self.storage, self.store.state(), self.config.persistence.codec())?;
                }
                StoreEffect::PersistSnapshot => {
                    tracing::info!("persistence consent not granted; change kept for this run only");
                }
                StoreEffect::LoadProjectTree(repo) => {
                    tracing::info!(repo = %repo.full_name(), "file tree loads once a session is connected");
                }
            }
        }
        Ok(())
    }

    fn status(&self) -> Status<'_> {
        let state = self.store.state();
        Status {
            active_view: state.active_view.as_str(),
            hidden_features: &state.hidden_features,
            connected: state.is_connected(),
            has_token: state.session.has_token(),
            selected_repo: state.selected_repo.as_ref().map(RepoSelection::full_name),
            consent: self.consent.label(),
            storage_dir: self.storage.dir().display().to_string(),
        }
    }
}

fn print_features(workspace: &Workspace, query: &str) {
    let state = workspace.store.state();
    for feature in FeatureRegistry::filtered(query) {
        let marker = if state.is_hidden(feature.id) { " (hidden)" } else { "" };
        println!(
            "{:<34} {:<14} {}{}",
            feature.id,
            feature.category.label(),
            feature.name,
            marker
        );
    }
}

fn print_help() {
    println!("devcore {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  devcore features [QUERY]");
    println!("  devcore show");
    println!("  devcore navigate VIEW");
    println!("  devcore toggle FEATURE");
    println!("  devcore select-repo OWNER/REPO|none");
    println!("  devcore logout");
    println!("  devcore consent grant|deny");
    println!("  devcore prompt FEATURE INPUT...");
    println!("  devcore --help");
    println!("  devcore --version");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn workspace_in(dir: &Path) -> Workspace {
        let mut config = Config::default();
        config.persistence.storage_dir = Some(dir.to_path_buf());
        Workspace::open(config).expect("open workspace")
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let config = read_config(&dir.path().join("absent.toml")).expect("config");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn config_file_overrides_sections() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[persistence]\ndebounce_ms = 50\n\n[model]\ndefault_model = \"local\"\n",
        )
        .expect("write");

        let config = read_config(&path).expect("config");

        assert_eq!(config.persistence.debounce_ms, 50);
        assert_eq!(config.model.default_model, "local");
        assert_eq!(config.image.max_retries, 3);
    }

    #[test]
    fn changes_persist_only_with_consent() {
        let dir = tempdir().expect("tempdir");

        let mut workspace = workspace_in(dir.path());
        workspace
            .apply(Action::toggle_feature("jwt-debugger"))
            .expect("apply");
        assert!(!workspace_in(dir.path()).store.state().is_hidden("jwt-debugger"));

        write_consent(&workspace_in(dir.path()).storage, true).expect("consent");
        let mut workspace = workspace_in(dir.path());
        workspace
            .apply(Action::toggle_feature("jwt-debugger"))
            .expect("apply");
        workspace
            .apply(Action::SetSelectedRepo(RepoSelection::parse("octocat/demo")))
            .expect("apply");

        let reopened = workspace_in(dir.path());
        assert!(reopened.store.state().is_hidden("jwt-debugger"));
        assert_eq!(
            reopened.status().selected_repo.as_deref(),
            Some("octocat/demo")
        );
        assert_eq!(reopened.status().consent, "granted");
    }

    #[test]
    fn selection_argument_parsing() {
        assert_eq!(parse_selection("none").expect("none"), None);
        assert_eq!(
            parse_selection("a/b").expect("repo"),
            Some(RepoSelection::new("a", "b"))
        );
        assert!(parse_selection("just-a-name").is_err());
    }

    #[test]
    fn chrome_views_are_navigable() {
        assert!(is_known_view(&ViewId::from("settings")));
        assert!(is_known_view(&ViewId::from("regex-sandbox")));
        assert!(!is_known_view(&ViewId::from("nowhere")));
    }
}
