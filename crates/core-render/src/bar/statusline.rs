//! The status-line layout algorithm (§4.6), carried verbatim from the
//! original `i3bar/src/xcb.c` `refresh_statusline` (see SPEC_FULL.md §3).

use core_plugin::{Align, StatusBlock};
use core_terminal::TextMetrics;

/// Step 1: compute each block's padded pixel width from its display text.
/// Padding is `2px` plus the block's own left/right border widths.
pub fn measure_block(block: &mut StatusBlock, use_short: bool, metrics: &dyn TextMetrics) {
    let text = block.display_text(use_short).to_string();
    let text_width = metrics.text_width(&text);
    block.computed_width = text_width + 2 + block.border_widths.left + block.border_widths.right;
}

/// Steps 2-4: distribute `min_width` padding per block's `align`, append
/// `separator_block_width` between blocks (not after the last one), and
/// return the resulting total pixmap width.
///
/// Center alignment splits the padding with the remainder going to the
/// right (`padding/2`, `padding/2 + padding%2`), matching the original's
/// rounding rule exactly.
pub fn layout_statusline(blocks: &mut [StatusBlock]) -> u32 {
    let mut total = 0u32;
    let last_idx = blocks.len().saturating_sub(1);
    for (i, block) in blocks.iter_mut().enumerate() {
        if block.min_width > block.computed_width {
            let padding = block.min_width - block.computed_width;
            match block.align {
                Align::Left => {
                    block.x_offset = 0;
                    block.x_append = padding;
                }
                Align::Right => {
                    block.x_offset = padding;
                    block.x_append = 0;
                }
                Align::Center => {
                    block.x_offset = padding / 2;
                    block.x_append = padding / 2 + padding % 2;
                }
            }
        } else {
            block.x_offset = 0;
            block.x_append = 0;
        }
        let effective_width = block.computed_width + block.x_offset + block.x_append;
        total += effective_width;
        if i != last_idx {
            total += block.separator_block_width;
        }
    }
    total
}
