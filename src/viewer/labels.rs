//! Selection label drawn as an egui overlay on top of the viewport image.

use crate::render::{LabelDrawer, LabelPlacement, LabelStyle, LabelTransparency, RenderItem};

/// Label text prepared by [`LabelDrawer::generate_label`]
#[derive(Debug, Clone)]
struct PreparedLabel {
    item: usize,
    text: String,
    style: LabelStyle,
}

/// Label queued for painting this frame, in viewport pixels
#[derive(Debug, Clone)]
pub struct PendingLabel {
    pub text: String,
    pub position: egui::Pos2,
    pub style: LabelStyle,
}

#[derive(Debug, Default)]
pub struct EguiLabels {
    prepared: Option<PreparedLabel>,
    pending: Option<PendingLabel>,
    generated: usize,
}

impl EguiLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of label regenerations so far
    pub fn generated(&self) -> usize {
        self.generated
    }

    /// Paint the queued label; `origin` is the viewport's top-left corner.
    pub fn paint(&mut self, painter: &egui::Painter, origin: egui::Pos2) {
        let Some(label) = self.pending.take() else {
            return;
        };
        let [r, g, b] = label.style.text_color;
        let text_color = egui::Rgba::from_rgb(r, g, b);
        // Font size is in label texture pixels; the overlay uses half
        let font = egui::FontId::proportional((label.style.font_size * 0.5).max(6.0));
        let galley = painter.layout_no_wrap(label.text, font, text_color.into());

        let size = galley.size();
        let center = origin + label.position.to_vec2() - egui::vec2(0.0, size.y);
        let rect = egui::Rect::from_center_size(center, size + egui::vec2(8.0, 4.0));

        let [br, bg, bb, ba] = label.style.background_color;
        let background_alpha = match label.style.transparency {
            LabelTransparency::None => Some(1.0),
            LabelTransparency::FromTheme => Some(ba),
            LabelTransparency::NoBackground => None,
        };
        if let Some(alpha) = background_alpha {
            painter.rect_filled(rect, 2.0, egui::Rgba::from_rgba_unmultiplied(br, bg, bb, alpha));
        }
        painter.galley(rect.center() - size * 0.5, galley, text_color.into());
    }
}

impl LabelDrawer for EguiLabels {
    fn generate_label(&mut self, item: &RenderItem, style: &LabelStyle) {
        self.prepared = Some(PreparedLabel {
            item: item.index,
            text: item.label_text(),
            style: style.clone(),
        });
        self.generated += 1;
    }

    fn draw_label(&mut self, item: &RenderItem, placement: &LabelPlacement) {
        let Some(prepared) = self.prepared.as_ref().filter(|p| p.item == item.index) else {
            tracing::debug!(item = item.index, "label drawn before it was generated");
            return;
        };
        let Some((x, y)) = placement.anchor_on_screen() else {
            return;
        };
        self.pending = Some(PendingLabel {
            text: prepared.text.clone(),
            position: egui::pos2(x, y),
            style: prepared.style.clone(),
        });
    }
}
