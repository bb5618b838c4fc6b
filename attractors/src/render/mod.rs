//! 3D figures of a [Trajectory], built with `plotly`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use plotly::{
    common::{Line, Marker, Mode, Title},
    layout::{
        AspectMode, AspectRatio, Axis, Camera, CameraCenter, Eye, LayoutScene, Up,
    },
    Layout, Plot, Scatter3D,
};
use serde::{Deserialize, Serialize};
use slog::{info, o, Discard, Logger};

use crate::{
    error::{AttractorError, RenderError},
    Trajectory,
};

pub mod colormap;

pub use colormap::Colormap;

/// How a trajectory is drawn and whether it is persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureOptions {
    pub title: String,
    pub colormap: Colormap,
    pub save_to_html: bool,
    pub output_dir: PathBuf,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            colormap: Colormap::default(),
            save_to_html: false,
            output_dir: PathBuf::from("./animations"),
        }
    }
}

impl FigureOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = colormap;
        self
    }

    pub fn save_to_html(mut self, save: bool) -> Self {
        self.save_to_html = save;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Where the figure is written when `save_to_html` is set.
    pub fn html_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_3d_animation.html", slug(&self.title)))
    }
}

/// Lower-case the words of `title` and join them with underscores.
pub fn slug(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// A built figure, and the file it was saved to if any.
pub struct Rendered {
    pub plot: Plot,
    pub path: Option<PathBuf>,
}

fn hidden_axis() -> Axis {
    Axis::new()
        .visible(false)
        .show_grid(false)
        .zero_line(false)
}

/// A single line+marker trace through the trajectory. The markers carry the `z` gradient.
pub fn figure(trajectory: &Trajectory, options: &FigureOptions) -> Plot {
    let (x, y, z) = trajectory.xyz();
    let trace = Scatter3D::new(x, y, z.clone())
        .mode(Mode::LinesMarkers)
        .marker(
            Marker::new()
                .size(1)
                .color_array(z)
                .color_scale(options.colormap.color_scale()),
        )
        .line(Line::new().width(3.0));

    let camera = Camera::new()
        .up(Up::from((1.0, 0.0, 0.0)))
        .center(CameraCenter::from((0.0, 0.0, 0.0)))
        .eye(Eye::from((0.0, 0.0, 2.0)));
    let scene = LayoutScene::new()
        .x_axis(hidden_axis())
        .y_axis(hidden_axis())
        .z_axis(hidden_axis())
        .camera(camera)
        .aspect_mode(AspectMode::Manual)
        .aspect_ratio(AspectRatio::from((1.0, 1.0, 1.0)));
    let layout = Layout::new()
        .width(800)
        .height(800)
        .auto_size(false)
        .title(Title::from(options.title.as_str()))
        .scene(scene);

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    plot
}

fn write_html(plot: &Plot, path: &Path) -> Result<(), RenderError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, plot.to_html())?;
    Ok(())
}

/// Build the figure and, if asked, write it as a standalone HTML file under `options.output_dir`.
pub fn render(trajectory: &Trajectory, options: &FigureOptions) -> Result<Rendered, AttractorError> {
    render_with_logger(trajectory, options, &Logger::root(Discard, o!()))
}

pub fn render_with_logger(
    trajectory: &Trajectory,
    options: &FigureOptions,
    logger: &Logger,
) -> Result<Rendered, AttractorError> {
    let plot = figure(trajectory, options);
    let path = if options.save_to_html {
        let path = options.html_path();
        write_html(&plot, &path)?;
        info!(logger, "figure saved"; "path" => %path.display(), "points" => trajectory.len());
        Some(path)
    } else {
        None
    };
    Ok(Rendered { plot, path })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Completion, State};

    fn trajectory() -> Trajectory {
        let times: Vec<f64> = (0..50).map(|i| f64::from(i) * 0.1).collect();
        let states = times
            .iter()
            .map(|t| State::new(t.cos(), t.sin(), *t))
            .collect();
        Trajectory::new(times, states, Completion::Complete)
    }

    #[test]
    fn slug_joins_lowercase_words() {
        assert_eq!(slug("Lorenz Attractor"), "lorenz_attractor");
        assert_eq!(slug("  Four-Wing   Attractor \t2 "), "four-wing_attractor_2");
        assert_eq!(slug(""), "");
    }

    #[test]
    fn html_file_name_comes_from_title() {
        let options = FigureOptions::new("Rabinovich Fabrikant");
        assert_eq!(
            options.html_path(),
            PathBuf::from("./animations/rabinovich_fabrikant_3d_animation.html")
        );
    }

    #[test]
    fn figure_uses_the_selected_colormap() {
        let options = FigureOptions::new("Helix").colormap(Colormap::Viridis);
        let json = figure(&trajectory(), &options).to_json();
        assert!(json.contains("scatter3d"));
        assert!(json.contains("Helix"));
        // only the markers carry the scale, the line is a plain stroke
        assert_eq!(json.matches("Viridis").count(), 1);
        assert!(json.contains(r#""width":3"#));
    }

    #[test]
    fn render_without_saving_writes_nothing() {
        let dir = std::env::temp_dir().join("attractors-render-nosave");
        let options = FigureOptions::new("Helix").output_dir(&dir);
        let rendered = render(&trajectory(), &options).unwrap();
        assert!(rendered.path.is_none());
        assert!(!options.html_path().exists());
    }

    #[test]
    fn render_saves_html() {
        let dir = std::env::temp_dir().join(format!("attractors-render-{}", std::process::id()));
        let options = FigureOptions::new("Test Helix")
            .save_to_html(true)
            .output_dir(&dir);
        let rendered = render(&trajectory(), &options).unwrap();
        let path = rendered.path.unwrap();
        assert_eq!(path, dir.join("test_helix_3d_animation.html"));
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("<html"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
