//! Turning an assignment back into a picture of the grid, either as text or as a bitmap.

use std::path::Path;

use log::debug;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::register_font;

use crate::assignment::Assignment;
use crate::grid_config::GridConfig;
use crate::word_list::WordList;
use crate::Error;

/// Character used for cells that can't hold a letter.
pub const BLOCK: char = '█';

/// Side of one cell in a saved image, in pixels.
pub const CELL_SIZE: u32 = 100;

/// Black margin drawn inside each cell edge, in pixels.
pub const CELL_BORDER: u32 = 2;

const LETTER_SIZE: f64 = 80.0;
const FONT_FAMILY: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

/// File extensions `save_image` can encode.
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "bmp", "jpg", "jpeg"];

/// The letter in each cell, indexed by `[row][col]`. Cells that are blocked or not yet covered by
/// an assigned word are `None`.
pub fn letter_grid(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; config.width]; config.height];

    for (slot_id, word_id) in assignment.iter() {
        let slot_config = &config.slot_configs[slot_id];
        let word = word_list.get(word_id);

        for ((row, col), &glyph) in slot_config.cell_coords().zip(&word.glyphs) {
            letters[row][col] = Some(glyph);
        }
    }

    letters
}

/// Turn the given grid config and assignment into a rendered string, one line per row. Blocks are
/// drawn as `BLOCK` and open cells without a letter as spaces.
pub fn render_grid(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> String {
    let letters = letter_grid(config, word_list, assignment);

    config
        .open_cells
        .iter()
        .zip(&letters)
        .map(|(open_row, letter_row)| {
            open_row
                .iter()
                .zip(letter_row)
                .map(|(&open, letter)| if open { letter.unwrap_or(' ') } else { BLOCK })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Does this path name an image format `save_image` can write?
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Image dimensions in pixels for the given grid.
pub fn image_size(config: &GridConfig) -> (u32, u32) {
    (config.width as u32 * CELL_SIZE, config.height as u32 * CELL_SIZE)
}

/// Paint the grid onto a drawing area sized by `image_size`. Open cells are white squares inset by
/// `CELL_BORDER` on black, with any assigned letter centered in its square.
pub fn draw_grid<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let letters = letter_grid(config, word_list, assignment);
    let font = (FONT_FAMILY, LETTER_SIZE).into_font().color(&BLACK).pos(Pos::new(HPos::Center, VPos::Center));
    let (cell_size, border) = (CELL_SIZE as i32, CELL_BORDER as i32);

    area.fill(&BLACK)?;

    for (row, (open_row, letter_row)) in config.open_cells.iter().zip(&letters).enumerate() {
        for (col, (&open, letter)) in open_row.iter().zip(letter_row).enumerate() {
            if !open {
                continue;
            }

            let (x, y) = (col as i32 * cell_size, row as i32 * cell_size);
            area.draw(&Rectangle::new(
                [(x + border, y + border), (x + cell_size - border, y + cell_size - border)],
                WHITE.filled(),
            ))?;

            if let Some(letter) = letter {
                area.draw(&Text::new(letter.to_string(), (x + cell_size / 2, y + cell_size / 2), &font))?;
            }
        }
    }

    Ok(())
}

/// Save the filled grid as an image, with the format picked from the path's extension.
pub fn save_image<P: AsRef<Path>>(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
    path: P,
) -> Result<(), Error> {
    let path = path.as_ref();
    let image_error = |message: String| Error::Image { path: path.to_path_buf(), message };

    register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES)
        .map_err(|_| image_error("bundled font could not be parsed".to_string()))?;

    let area = BitMapBackend::new(path, image_size(config)).into_drawing_area();
    draw_grid(&area, config, word_list, assignment).map_err(|err| image_error(err.to_string()))?;
    area.present().map_err(|err| image_error(err.to_string()))?;

    debug!("Saved {}x{} grid image to {}", config.width, config.height, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_config::generate_grid_config_from_template_string;

    #[test]
    fn test_render_full_and_partial_assignments() {
        let config = generate_grid_config_from_template_string(
            "
            ___#
            _#__
            ",
        )
        .unwrap();
        let word_list = WordList::from_words(["cat", "co"]);

        // Slots: 0 is "___" across, 1 is "__" across on row 1, 2 and 3 are "__" down from (0, 0)
        // and (0, 2).
        let mut assignment = Assignment::new(config.slot_count());
        assignment.assign(0, word_list.find("cat").unwrap());
        assert_eq!(render_grid(&config, &word_list, &assignment), "CAT█\n █  ");

        assignment.assign(2, word_list.find("co").unwrap());
        assert_eq!(render_grid(&config, &word_list, &assignment), "CAT█\nO█  ");

        let letters = letter_grid(&config, &word_list, &assignment);
        assert_eq!(letters[1][0], Some('O'));
        assert_eq!(letters[0][3], None);
    }

    /// #_
    /// __
    fn corner_config() -> (GridConfig, WordList, Assignment) {
        let config = generate_grid_config_from_template_string("#_\n__").unwrap();
        let word_list = WordList::from_words(["ba", "ha"]);

        // Slot 0 is "__" across on row 1, slot 1 is "__" down from (0, 1).
        let mut assignment = Assignment::new(config.slot_count());
        assignment.assign(0, word_list.find("ba").unwrap());
        assignment.assign(1, word_list.find("ha").unwrap());
        (config, word_list, assignment)
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("out.png")));
        assert!(is_image_path(Path::new("dir/out.JPEG")));
        assert!(!is_image_path(Path::new("out.txt")));
        assert!(!is_image_path(Path::new("png")));
    }

    #[test]
    fn test_draw_grid_pixels() {
        let (config, word_list, assignment) = corner_config();
        assert!(register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES).is_ok());

        let (width, height) = image_size(&config);
        assert_eq!((width, height), (200, 200));

        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let area = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            draw_grid(&area, &config, &word_list, &assignment).unwrap();
            area.present().unwrap();
        }
        let pixel = |x: u32, y: u32| {
            let idx = ((y * width + x) * 3) as usize;
            (buffer[idx], buffer[idx + 1], buffer[idx + 2])
        };

        // Block cell and cell borders are black, open cells are white away from their letter.
        assert_eq!(pixel(50, 50), (0, 0, 0));
        assert_eq!(pixel(100, 150), (0, 0, 0));
        assert_eq!(pixel(199, 199), (0, 0, 0));
        assert_eq!(pixel(5, 105), (255, 255, 255));
        assert_eq!(pixel(195, 5), (255, 255, 255));

        // Every open cell holds a letter, so each has some dark pixels inside its square.
        for (cell_x, cell_y) in [(1, 0), (0, 1), (1, 1)] {
            let inked = (10..90)
                .flat_map(|dy| (10..90).map(move |dx| (cell_x * 100 + dx, cell_y * 100 + dy)))
                .filter(|&(x, y)| pixel(x, y).0 < 128)
                .count();
            assert!(inked > 0, "no letter drawn in cell ({cell_y}, {cell_x})");
        }
    }

    #[test]
    fn test_save_image_writes_png() {
        let (config, word_list, assignment) = corner_config();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.png");

        save_image(&config, &word_list, &assignment, &path).unwrap();

        // PNG signature, then the IHDR chunk carrying big-endian width and height.
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(&bytes[12..16], b"IHDR");
        assert_eq!(u32::from_be_bytes(bytes[16..20].try_into().unwrap()), 200);
        assert_eq!(u32::from_be_bytes(bytes[20..24].try_into().unwrap()), 200);
    }

    #[test]
    fn test_save_image_reports_unwritable_path() {
        let (config, word_list, assignment) = corner_config();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("grid.png");

        let err = save_image(&config, &word_list, &assignment, &path).unwrap_err();
        assert!(matches!(err, Error::Image { .. }));
        assert!(err.to_string().contains("grid.png"));
    }
}
