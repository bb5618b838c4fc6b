use anyhow::Context;
use attractors::{
    render_with_logger, Attractor, Colormap, Completion, DivergencePolicy, FigureOptions,
    Integrator, Parameters, Window,
};
use slog::{info, o, warn, Drain, Logger};

fn terminal_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!("demo" => "gallery"))
}

fn main() -> anyhow::Result<()> {
    let logger = terminal_logger();
    info!(logger, "rendering gallery"; "attractors" => Attractor::ALL.len(),
        "output_dir" => %FigureOptions::default().output_dir.display());
    let integrator = Integrator::builder()
        .divergence_policy(DivergencePolicy::Truncate)
        .logger(logger.clone())
        .build();

    for (i, attractor) in Attractor::ALL.into_iter().enumerate() {
        let params = Parameters::preset(attractor);
        let trajectory = integrator
            .integrate_attractor(&params, attractor.preset_initial_state(), Window::default())
            .with_context(|| format!("integrating {attractor}"))?;
        if let Completion::Partial { diverged_at } = trajectory.completion() {
            warn!(logger, "rendering a partial trajectory"; "attractor" => attractor.name(),
                "diverged_at" => diverged_at, "points" => trajectory.len());
        }

        let colormap = Colormap::from_index(i % Colormap::ALL.len())?;
        let options = FigureOptions::new(format!("{} Attractor", attractor.display_name()))
            .colormap(colormap)
            .save_to_html(true);
        render_with_logger(&trajectory, &options, &logger)
            .with_context(|| format!("rendering {attractor}"))?;
    }
    Ok(())
}
