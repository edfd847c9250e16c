//! Synthetic article feed: articles with ad slots interleaved, laid out top to bottom.

use kurbo::Rect;

use crate::config::SimulationConfig;
use crate::geometry::frame;

/// Vertical gap between feed items.
pub const ITEM_SPACING: f64 = 16.0;

/// Article heights cycle through these so slots do not land on a regular grid.
const ARTICLE_HEIGHTS: [f64; 4] = [480.0, 620.0, 410.0, 560.0];

/// Ad unit ids follow the publisher's `div-gpt-ad-mobile_<n>` naming.
pub fn ad_unit_id(index: usize) -> String {
    format!("div-gpt-ad-mobile_{}", index)
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedItemKind {
    Article { index: usize },
    Ad { ad_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub kind: FeedItemKind,
    /// Frame in content coordinates
    pub frame: Rect,
}

/// Laid-out feed content
#[derive(Debug, Clone)]
pub struct Feed {
    items: Vec<FeedItem>,
    width: f64,
    content_height: f64,
}

impl Feed {
    /// Lay out a banner ad, then `articles` articles with an ad after every `ad_every`.
    pub fn build(config: &SimulationConfig) -> Self {
        let width = config.viewport_width;
        let mut items = Vec::new();
        let mut y = 0.0;
        let mut ads = 0;

        let mut push = |kind: FeedItemKind, height: f64, y: &mut f64| {
            items.push(FeedItem {
                kind,
                frame: frame(0.0, *y, width, height),
            });
            *y += height + ITEM_SPACING;
        };

        ads += 1;
        push(FeedItemKind::Ad { ad_id: ad_unit_id(ads) }, config.ad_height, &mut y);

        for index in 0..config.articles {
            let height = ARTICLE_HEIGHTS[index % ARTICLE_HEIGHTS.len()];
            push(FeedItemKind::Article { index }, height, &mut y);

            if config.ad_every > 0 && (index + 1) % config.ad_every == 0 {
                ads += 1;
                push(FeedItemKind::Ad { ad_id: ad_unit_id(ads) }, config.ad_height, &mut y);
            }
        }

        let content_height = (y - ITEM_SPACING).max(0.0);
        Self {
            items,
            width,
            content_height,
        }
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn content_height(&self) -> f64 {
        self.content_height
    }

    /// Ad slots in feed order.
    pub fn ad_slots(&self) -> impl Iterator<Item = (&str, Rect)> + '_ {
        self.items.iter().filter_map(|item| match &item.kind {
            FeedItemKind::Ad { ad_id } => Some((ad_id.as_str(), item.frame)),
            FeedItemKind::Article { .. } => None,
        })
    }

    /// Furthest scroll offset for a viewport of the given height.
    pub fn max_scroll(&self, viewport_height: f64) -> f64 {
        (self.content_height - viewport_height).max(0.0)
    }
}
