use std::path::PathBuf;
use std::time::Duration;

use avicam::capture::SyntheticSource;
use avicam::control;
use avicam::http::{self, HttpState};
use avicam::recorder::RecordingSession;
use avicam::scheduler::Scheduler;
use avicam::storage::StdStorage;
use avicam::trigger::LevelFile;
use avicam::{logging, Config};

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("avicam.json"));

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let _logging_guards = logging::init(&config.log_dir);
    tracing::info!(
        target: "system",
        "avicam {} starting, storage at {:?}",
        env!("CARGO_PKG_VERSION"),
        config.storage_root
    );

    let http_addr: std::net::SocketAddr = match config.http_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(target: "system", "invalid httpAddr {:?}: {}", config.http_addr, e);
            std::process::exit(1);
        }
    };

    let storage = StdStorage::new(&config.storage_root);
    let frames = SyntheticSource::new(config.frame_width, config.frame_height);
    let session = RecordingSession::new(storage.clone(), config.video_params());
    let trigger = config.trigger_gpio_value.as_ref().map(LevelFile::new);

    let (handle, requests) = control::channel();
    let http_state = HttpState::new(handle.clone(), storage);

    // HTTP runs on its own runtime; the scheduler keeps the main thread.
    // Ctrl-C lands here too and is relayed as a shutdown request.
    let http_thread = std::thread::Builder::new()
        .name("http".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!(target: "http", "runtime startup failed: {}", e);
                    handle.shutdown();
                    return;
                }
            };

            runtime.block_on(async {
                tokio::select! {
                    result = http::serve(http_addr, http_state) => {
                        if let Err(e) = result {
                            tracing::error!(target: "http", "server error: {}", e);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!(target: "system", "interrupt received, shutting down");
                    }
                }
            });
            handle.shutdown();
        })
        .expect("failed to spawn http thread");

    Scheduler::new(
        session,
        frames,
        trigger,
        requests,
        Duration::from_millis(config.trigger_poll_ms),
    )
    .run();

    let _ = http_thread.join();
    tracing::info!(target: "system", "avicam stopped");
}
