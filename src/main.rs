use domain::otp::parse_endpoint;
use domain::{Dispatch, OtpComponent, OtpLength};
use log::*;
use service::{config::Config, logging::Logger};
use sse::EventSourceConnector;

mod render;

use render::Renderer;

enum Step {
    Shutdown,
    Dispatch(Option<Dispatch>),
}

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    if let Err(e) = run(&config).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let endpoint = parse_endpoint(config.backend_url())?;
    let length = OtpLength::try_from(config.digits)?;

    let mut component = OtpComponent::new(EventSourceConnector::new(), endpoint)
        .with_length(length);
    let mut renderer = Renderer::new();

    component.generate();
    renderer.render(&component.view());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let step = tokio::select! {
            _ = &mut shutdown => Step::Shutdown,
            dispatch = component.next_dispatch() => Step::Dispatch(dispatch),
        };

        match step {
            Step::Shutdown => {
                info!("Interrupted, closing OTP stream");
                component.teardown();
                return Ok(());
            }
            Step::Dispatch(Some(dispatch)) => {
                component.apply(dispatch);

                let view = component.view();
                renderer.render(&view);

                if config.once && view.generated && view.time_left == 0 {
                    component.teardown();
                    return Ok(());
                }
            }
            // Nothing left to wait for: the request failed and is not retried.
            Step::Dispatch(None) => break,
        }
    }

    match &component.state().error {
        Some(message) => anyhow::bail!("{message}"),
        None => Ok(()),
    }
}
