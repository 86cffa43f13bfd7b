use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info, warn};
mod commands;
mod config;
mod error;
mod events;
mod services;
mod tree;
mod utils;

use config::{Config, LoggingConfig};
use error::SwayctrlError;
use services::create_compositor;
use tree::WindowCriteria;

#[derive(Parser, Debug)]
#[command(name = "swayctrl")]
#[command(version, about = "Управление окнами sway: фокус по критериям, история фокуса, запуск")]
struct Args {
    /// Путь к файлу конфигурации (по умолчанию $XDG_CONFIG_HOME/swayctrl/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Режим сухого запуска: дерево в памяти, команды sway только логируются
    #[arg(long, global = true)]
    dry_run: bool,

    /// Уровень или фильтр логирования (перекрывает конфигурацию, но не RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Запустить приложение и сфокусировать его новое окно
    Launch {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Сфокусировать лучшее окно по заголовку и/или app_id
    Focus {
        /// Регулярное выражение для заголовка
        #[arg(long)]
        title: Option<String>,
        /// Точный app_id
        #[arg(long = "appid")]
        app_id: Option<String>,
        /// Команда оболочки, если подходящих окон нет
        #[arg(long)]
        launch: Option<String>,
    },
    /// Напечатать дерево sway
    Tree,
    /// Следующее окно того же приложения
    Appnext,
    /// Предыдущее окно из истории фокуса
    Prev,
    /// Печатать заголовок сфокусированного окна при каждой смене
    Focustitle,
    /// swaymsg с правильным SWAYSOCK
    Swaymsg {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Демон истории фокуса
    Daemon {
        /// Логировать список MRU после каждого события
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    init_tracing(args.log_level.as_deref(), &config.logging)?;
    debug!("Конфигурация загружена из: {:?}", config_path);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    match args.command {
        Command::Swaymsg { args: swaymsg_args } => {
            let code = commands::passthrough::run(&config.sway, &swaymsg_args)?;
            std::process::exit(code);
        }
        Command::Launch { command } => {
            let (program, rest) = command
                .split_first()
                .ok_or_else(|| SwayctrlError::Precondition("Не указана команда запуска".to_string()))?;
            let compositor = create_compositor(&config, args.dry_run)?;
            commands::launch::run(compositor.as_ref(), &config.launch, program, rest).await?;
        }
        Command::Focus { title, app_id, launch } => {
            let criteria = WindowCriteria::new(title.as_deref(), app_id.as_deref())?;
            let client = commands::daemon_client(&config)?;
            let compositor = create_compositor(&config, args.dry_run)?;
            commands::focus::run(compositor.as_ref(), &client, &criteria, launch.as_deref(), &config.launch)
                .await?;
        }
        Command::Tree => {
            let compositor = create_compositor(&config, args.dry_run)?;
            commands::tree::run(compositor.as_ref(), &mut std::io::stdout().lock()).await?;
        }
        Command::Appnext => {
            let compositor = create_compositor(&config, args.dry_run)?;
            commands::appnext::run(compositor.as_ref()).await?;
        }
        Command::Prev => {
            let client = commands::daemon_client(&config)?;
            let compositor = create_compositor(&config, args.dry_run)?;
            commands::prev::run(compositor.as_ref(), &client).await?;
        }
        Command::Focustitle => {
            let compositor = create_compositor(&config, args.dry_run)?;
            commands::focus_title::run(compositor.as_ref(), &mut std::io::stdout()).await?;
        }
        Command::Daemon { verbose } => {
            commands::daemon::install_abort_on_panic();
            info!("Запуск swayctrl daemon v{}", env!("CARGO_PKG_VERSION"));
            let compositor = create_compositor(&config, args.dry_run)?;
            commands::daemon::run(&config, compositor, verbose).await?;
            info!("swayctrl daemon завершил работу");
        }
    }

    Ok(())
}

/// RUST_LOG имеет приоритет, затем --log-level, затем фильтр из конфигурации.
/// Вывод в stderr: stdout занят командами `tree` и `focustitle`.
fn init_tracing(cli_level: Option<&str>, logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let directives = match cli_level {
        Some(level) => level.to_string(),
        None if !logging.filter.is_empty() => logging.filter.clone(),
        None => logging.level.clone(),
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&directives))?;

    let (compact, json) = if logging.format == "json" {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().compact().with_writer(std::io::stderr)), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(json)
        .init();

    Ok(())
}
