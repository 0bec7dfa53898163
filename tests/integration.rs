use image::{Rgba, RgbaImage};
use sticker_grid::{
    background, codec, grid, GridLayout, GridSchedule, Mask, MaskValue, PipelineConfig,
    ProcessOptions, StickerEngine,
};
use tempfile::tempdir;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RED: Rgba<u8> = Rgba([220, 20, 20, 255]);

/// 400x400 white image with a centred 200x200 square.
fn square_sticker(color: Rgba<u8>) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(400, 400, WHITE);
    for y in 100..300 {
        for x in 100..300 {
            img.put_pixel(x, y, color);
        }
    }
    img
}

#[test]
fn red_square_scenario_end_to_end() {
    let layout = GridLayout::default();
    let sources = vec![square_sticker(RED); 8];

    let composited = grid::composite(&sources, layout).unwrap();
    assert_eq!(composited.dimensions(), (740, 1280));
    // 400x400 fits 370x320 as 320x320; the square becomes 160x160 centred.
    assert_eq!(*composited.get_pixel(185, 160), RED);
    assert_eq!(*composited.get_pixel(370 + 185, 960 + 160), RED);
    assert_eq!(*composited.get_pixel(10, 10), WHITE);
    assert_eq!(*composited.get_pixel(60, 160), WHITE);

    let cleared = background::remove_background(&composited, 240, None).unwrap();
    assert_eq!(cleared.get_pixel(10, 10)[3], 0);
    assert_eq!(cleared.get_pixel(370, 640)[3], 0);
    assert_eq!(cleared.get_pixel(185, 160)[3], 255);

    let cells = grid::split(&cleared, layout);
    assert_eq!(cells.len(), 8);
    for cell in &cells {
        assert_eq!(cell.dimensions(), (370, 320));
        assert_eq!(*cell.get_pixel(185, 160), RED);
        assert_eq!(cell.get_pixel(120, 100)[3], 255);
        assert_eq!(cell.get_pixel(0, 0)[3], 0);
        assert_eq!(cell.get_pixel(369, 319)[3], 0);
        assert_eq!(cell.get_pixel(60, 160)[3], 0);
    }
}

#[test]
fn dark_divider_becomes_transparent_after_background_removal() {
    let layout = GridLayout::default();
    let sources = vec![square_sticker(RED); 8];
    let mut composited = grid::composite(&sources, layout).unwrap();
    for y in 0..composited.height() {
        composited.put_pixel(370, y, Rgba([40, 40, 40, 255]));
    }

    // The fill stops at the divider, so it is still opaque here.
    let cleared = background::remove_background(&composited, 240, None).unwrap();
    assert_eq!(cleared.get_pixel(370, 160)[3], 255);

    let cells = grid::split(&cleared, layout);
    for y in 0..320 {
        assert_eq!(*cells[1].get_pixel(0, y), Rgba([255, 255, 255, 0]), "cell 1 y={y}");
        assert_eq!(cells[0].get_pixel(369, y)[3], 0, "cell 0 y={y}");
    }
    assert_eq!(cells[0].get_pixel(10, 160)[3], 0);
    assert_eq!(*cells[1].get_pixel(185, 160), RED);
}

#[test]
fn split_of_fresh_composite_round_trips() {
    let layout = GridLayout::default();
    let sources: Vec<_> = (0..8u8)
        .map(|i| square_sticker(Rgba([i * 30, 100, 255 - i * 30, 255])))
        .collect();

    let composited = grid::composite(&sources, layout).unwrap();
    let cells = grid::split(&composited, layout);

    for (cell, src) in cells.iter().zip(&sources) {
        let expected = grid::fit_onto_canvas(src, 370, 320, WHITE);
        assert!(cell == &expected, "cell differs from its placed source");
    }
}

#[test]
fn fully_dark_border_keeps_image_opaque() {
    let mut img = RgbaImage::from_pixel(50, 40, Rgba([200, 200, 200, 255]));
    for y in 10..30 {
        for x in 10..40 {
            img.put_pixel(x, y, WHITE);
        }
    }
    let out = background::remove_background(&img, 240, None).unwrap();
    assert_eq!(out, img);
}

#[test]
fn seam_erasure_is_idempotent_on_clean_grids() {
    let layout = GridLayout::default();
    let composited = grid::composite(&[square_sticker(RED)], layout).unwrap();
    let once = sticker_grid::seams::erase_seams(&composited, layout);
    let twice = sticker_grid::seams::erase_seams(&once, layout);
    assert!(once == twice);
}

#[test]
fn twenty_stickers_make_three_grids() {
    let schedule = GridSchedule::new(20, std::time::Duration::ZERO);
    let cells: Vec<_> = schedule.slots().iter().map(|s| s.real_cells).collect();
    assert_eq!(cells, vec![8, 8, 4]);
}

#[test]
fn process_directory_writes_sticker_set() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    for i in 0..10u8 {
        let img = square_sticker(Rgba([i * 20, 0, 200, 255]));
        img.save(input.path().join(format!("src_{i:02}.png"))).unwrap();
    }

    let engine = StickerEngine::new(PipelineConfig::default());
    let opts = ProcessOptions {
        keep_grids: true,
        ..ProcessOptions::default()
    };
    let result = engine.process_directory(input.path(), output.path(), &opts);

    assert!(result.success, "{}", result.message);
    assert_eq!(result.stickers, 10);
    for name in ["01.png", "10.png", "main.png", "tab.png", "grid_02.png"] {
        assert!(output.path().join(name).exists(), "{name} missing");
    }
    assert!(!output.path().join("11.png").exists());

    let tenth = codec::load(&output.path().join("10.png")).unwrap();
    assert_eq!(tenth.dimensions(), (370, 320));
    assert_eq!(tenth.get_pixel(185, 160).0, [180, 0, 200, 255]);
    assert_eq!(tenth.get_pixel(5, 5)[3], 0);

    let tab = codec::load(&output.path().join("tab.png")).unwrap();
    assert_eq!(tab.dimensions(), (96, 74));
}

#[test]
fn process_directory_reports_empty_input() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let result = StickerEngine::default().process_directory(
        input.path(),
        output.path(),
        &ProcessOptions::default(),
    );
    assert!(!result.success);
}

#[test]
fn split_file_keeps_only_real_cells() {
    let dir = tempdir().unwrap();
    let layout = GridLayout::default();
    let sources = vec![square_sticker(RED); 3];
    let sheet = grid::composite(&sources, layout).unwrap();
    let sheet_path = dir.path().join("sheet.png");
    sheet.save(&sheet_path).unwrap();

    let out_dir = dir.path().join("out");
    let opts = ProcessOptions {
        real_cells: Some(3),
        ..ProcessOptions::default()
    };
    let result = StickerEngine::default().split_file(&sheet_path, &out_dir, &opts);

    assert!(result.success, "{}", result.message);
    assert_eq!(result.stickers, 3);
    assert!(out_dir.join("03.png").exists());
    assert!(!out_dir.join("04.png").exists());
}

#[test]
fn split_file_fails_on_undecodable_grid() {
    let dir = tempdir().unwrap();
    let bogus = dir.path().join("sheet.png");
    std::fs::write(&bogus, b"not a png").unwrap();

    let result =
        StickerEngine::default().split_file(&bogus, dir.path(), &ProcessOptions::default());
    assert!(!result.success);
    assert!(result.message.contains("Failed to load"));
}

#[test]
fn remove_background_file_applies_painted_mask() {
    let dir = tempdir().unwrap();
    let img = square_sticker(RED);
    let input = dir.path().join("cat.png");
    img.save(&input).unwrap();

    // Protect the top-left corner, delete the square's centre.
    let mut overlay = RgbaImage::new(400, 400);
    overlay.put_pixel(0, 0, Rgba([0, 255, 0, 255]));
    overlay.put_pixel(200, 200, Rgba([255, 0, 0, 255]));
    let mask_path = dir.path().join("mask.png");
    overlay.save(&mask_path).unwrap();

    let output = dir.path().join("cat_nobg.png");
    let result = StickerEngine::default().remove_background_file(
        &input,
        &output,
        Some(mask_path.as_path()),
    );
    assert!(result.success, "{}", result.message);

    let out = codec::load(&output).unwrap();
    assert_eq!(*out.get_pixel(0, 0), WHITE);
    assert_eq!(out.get_pixel(1, 0)[3], 0);
    assert_eq!(out.get_pixel(200, 200)[3], 0);
    assert_eq!(out.get_pixel(150, 150)[3], 255);
}

#[test]
fn mask_brush_protects_enclosed_area() {
    let img = square_sticker(WHITE);
    let mut mask = Mask::new(400, 400);
    mask.paint(200, 200, 50, MaskValue::Protect);

    let out = background::remove_background(&img, 240, Some(&mask)).unwrap();
    assert_eq!(out.get_pixel(200, 200)[3], 255);
    assert_eq!(out.get_pixel(100, 100)[3], 0);
}
