//! Assembles configured zones into the drawer graph.

use std::str::FromStr;

use tracing::{info, warn};

use placebot_core::config::ZoneConfig;
use placebot_core::error::{PlacebotError, Result};

use crate::drawer::{BitmapDrawer, CompositeDrawer, Drawer};
use crate::fill::FillKind;
use crate::image::TargetImage;

/// Draw strategy selector from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrawKind {
    #[default]
    Bitmap,
}

impl DrawKind {
    pub fn build(
        self,
        offset: (i32, i32),
        fill: FillKind,
        image: TargetImage,
    ) -> Box<dyn Drawer> {
        match self {
            Self::Bitmap => Box::new(BitmapDrawer::new(offset, fill.build(), image)),
        }
    }
}

impl FromStr for DrawKind {
    type Err = PlacebotError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "" | "bitmap" => Ok(Self::Bitmap),
            other => Err(PlacebotError::Config(format!("invalid zone type: {other}"))),
        }
    }
}

/// Build the priority-ordered drawer graph.
///
/// Every selector is resolved before anything is built, so a bad zone
/// fails the whole configuration.
pub fn build_zones<'a>(
    zones: impl IntoIterator<Item = (&'a str, &'a ZoneConfig)>,
) -> Result<CompositeDrawer> {
    let resolved = zones
        .into_iter()
        .map(|(name, zone)| {
            let fill = zone
                .fill
                .parse::<FillKind>()
                .map_err(|e| PlacebotError::Config(format!("zone '{name}': {e}")))?;
            let draw = zone
                .draw
                .parse::<DrawKind>()
                .map_err(|e| PlacebotError::Config(format!("zone '{name}': {e}")))?;
            Ok((name, zone, fill, draw))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut composite = CompositeDrawer::new();
    for (name, zone, fill, draw) in resolved {
        let image = TargetImage::parse(&zone.data);
        let cells = image.opaque_cells();
        if cells == 0 {
            warn!(zone = name, "Zone image has no opaque cells");
        }
        info!(
            zone = name,
            x = zone.position[0],
            y = zone.position[1],
            width = image.width(),
            height = image.height(),
            cells,
            ?fill,
            ?draw,
            "Zone configured"
        );
        let offset = (zone.position[0], zone.position[1]);
        composite.push(name, draw.build(offset, fill, image));
    }
    Ok(composite)
}
