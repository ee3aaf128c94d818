use citadel::config::Config;
use citadel::server::pool::WorkerPool;
use citadel::server::reactor::Reactor;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let pool = WorkerPool::new(cfg.workers, cfg.max_connections)?;
    let mut reactor = Reactor::new(&cfg, pool)?;
    reactor.run()
}
