use std::{fmt, str::FromStr};

use plotly::common::{ColorScale, ColorScalePalette};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AttractorError, RenderError},
    render_error,
};

/// Named color scales, in the order used by [Colormap::from_index].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Colormap {
    #[default]
    Blackbody,
    Bluered,
    Blues,
    Earth,
    Electric,
    Greens,
    Greys,
    Hot,
    Jet,
    Picnic,
    Portland,
    Rainbow,
    RdBu,
    Reds,
    Viridis,
    YlGnBu,
    YlOrRd,
}

impl Colormap {
    pub const ALL: [Colormap; 17] = [
        Colormap::Blackbody,
        Colormap::Bluered,
        Colormap::Blues,
        Colormap::Earth,
        Colormap::Electric,
        Colormap::Greens,
        Colormap::Greys,
        Colormap::Hot,
        Colormap::Jet,
        Colormap::Picnic,
        Colormap::Portland,
        Colormap::Rainbow,
        Colormap::RdBu,
        Colormap::Reds,
        Colormap::Viridis,
        Colormap::YlGnBu,
        Colormap::YlOrRd,
    ];

    pub fn from_index(index: usize) -> Result<Self, AttractorError> {
        Self::ALL.get(index).copied().ok_or_else(|| {
            render_error!(
                InvalidColormap,
                format!("index {index} out of range 0..{}", Self::ALL.len())
            )
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Colormap::Blackbody => "Blackbody",
            Colormap::Bluered => "Bluered",
            Colormap::Blues => "Blues",
            Colormap::Earth => "Earth",
            Colormap::Electric => "Electric",
            Colormap::Greens => "Greens",
            Colormap::Greys => "Greys",
            Colormap::Hot => "Hot",
            Colormap::Jet => "Jet",
            Colormap::Picnic => "Picnic",
            Colormap::Portland => "Portland",
            Colormap::Rainbow => "Rainbow",
            Colormap::RdBu => "RdBu",
            Colormap::Reds => "Reds",
            Colormap::Viridis => "Viridis",
            Colormap::YlGnBu => "YlGnBu",
            Colormap::YlOrRd => "YlOrRd",
        }
    }

    pub fn color_scale(self) -> ColorScale {
        let palette = match self {
            Colormap::Blackbody => ColorScalePalette::Blackbody,
            Colormap::Bluered => ColorScalePalette::Bluered,
            Colormap::Blues => ColorScalePalette::Blues,
            Colormap::Earth => ColorScalePalette::Earth,
            Colormap::Electric => ColorScalePalette::Electric,
            Colormap::Greens => ColorScalePalette::Greens,
            Colormap::Greys => ColorScalePalette::Greys,
            Colormap::Hot => ColorScalePalette::Hot,
            Colormap::Jet => ColorScalePalette::Jet,
            Colormap::Picnic => ColorScalePalette::Picnic,
            Colormap::Portland => ColorScalePalette::Portland,
            Colormap::Rainbow => ColorScalePalette::Rainbow,
            Colormap::RdBu => ColorScalePalette::RdBu,
            Colormap::Reds => ColorScalePalette::Reds,
            Colormap::Viridis => ColorScalePalette::Viridis,
            Colormap::YlGnBu => ColorScalePalette::YlGnBu,
            Colormap::YlOrRd => ColorScalePalette::YlOrRd,
        };
        ColorScale::Palette(palette)
    }
}

impl FromStr for Colormap {
    type Err = AttractorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or_else(|| render_error!(InvalidColormap, format!("unknown colormap {s:?}")))
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn colormaps_in_selector_order() {
        let names: Vec<&str> = Colormap::ALL.iter().map(|c| c.name()).collect();
        insta::assert_yaml_snapshot!(names, @r"
        - Blackbody
        - Bluered
        - Blues
        - Earth
        - Electric
        - Greens
        - Greys
        - Hot
        - Jet
        - Picnic
        - Portland
        - Rainbow
        - RdBu
        - Reds
        - Viridis
        - YlGnBu
        - YlOrRd
        ");
    }

    #[test]
    fn select_by_index_and_name() {
        assert_eq!(Colormap::from_index(0).unwrap(), Colormap::Blackbody);
        assert_eq!(Colormap::from_index(14).unwrap(), Colormap::Viridis);
        assert_eq!(Colormap::from_index(16).unwrap(), Colormap::YlOrRd);
        assert!(matches!(
            Colormap::from_index(17),
            Err(AttractorError::RenderError(RenderError::InvalidColormap(_)))
        ));
        for c in Colormap::ALL {
            assert_eq!(c.name().parse::<Colormap>().unwrap(), c);
        }
        assert!("viridis".parse::<Colormap>().is_err());
    }
}
