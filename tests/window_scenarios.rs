//! End-to-end window drawing through the renderer on a headless screen.

use mooze::core::{Ellipsis, Style};
use mooze::ui::{Renderer, Window, WindowCompositor};

fn renderer() -> Renderer<Vec<u8>> {
    Renderer::headless(Vec::new(), 40, 15)
}

/// `len` cells of `row` starting at `col`, continuation cells skipped.
fn text_at(r: &Renderer<Vec<u8>>, row: u16, col: u16, len: u16) -> String {
    (col..col + len)
        .filter_map(|c| r.screen().cell(row, c))
        .filter(|cell| !cell.is_continuation())
        .map(|cell| cell.display_str().to_string())
        .collect()
}

fn request_window() -> Window {
    Window::new(2, 2, 10, 20)
        .with_title("Req")
        .with_content(["GET /ping", "200 OK"])
}

#[test]
fn test_request_window_layout() {
    let mut r = renderer();
    r.render_window(&request_window(), Style::default());
    r.show().unwrap();

    // Border spans 20 columns and 10 rows from (2, 2)
    assert_eq!(text_at(&r, 2, 2, 1), "┌");
    assert_eq!(text_at(&r, 2, 21, 1), "┐");
    assert_eq!(text_at(&r, 11, 2, 1), "└");
    assert_eq!(text_at(&r, 11, 21, 1), "┘");
    assert_eq!(text_at(&r, 11, 2, 20), format!("└{}┘", "─".repeat(18)));
    for row in 3..11 {
        assert_eq!(text_at(&r, row, 2, 1), "│");
        assert_eq!(text_at(&r, row, 21, 1), "│");
    }

    // Nothing drawn outside
    assert_eq!(text_at(&r, 1, 0, 40).trim(), "");
    assert_eq!(text_at(&r, 12, 0, 40).trim(), "");
    assert_eq!(text_at(&r, 5, 22, 18).trim(), "");

    // Title on the top edge, one cell inside the corner
    assert_eq!(text_at(&r, 2, 2, 20), format!("┌Req{}┐", "─".repeat(15)));

    // Content unmodified
    assert_eq!(text_at(&r, 3, 3, 18), "GET /ping         ");
    assert_eq!(text_at(&r, 4, 3, 18), "200 OK            ");
    assert_eq!(text_at(&r, 5, 3, 18), " ".repeat(18));

    let out = String::from_utf8_lossy(r.writer()).into_owned();
    assert!(out.contains("Req"));
    assert!(out.contains("GET /ping"));
}

#[test]
fn test_long_line_truncated_to_interior() {
    let mut r = renderer();
    let window = request_window().with_content(["a very long line that exceeds eighteen columns"]);
    r.render_window(&window, Style::default());

    assert_eq!(text_at(&r, 3, 3, 18), "a very long lin...");
    // Right border intact
    assert_eq!(text_at(&r, 3, 21, 1), "│");
}

#[test]
fn test_short_ellipsis_configured() {
    let mut r = renderer().with_compositor(WindowCompositor::new(Ellipsis::Short));
    let window = request_window().with_content(["a very long line that exceeds eighteen columns"]);
    r.render_window(&window, Style::default());

    assert_eq!(text_at(&r, 3, 3, 18), "a very long line..");
}

#[test]
fn test_overflowing_content_ends_with_ellipsis_row() {
    let mut r = renderer();
    let lines: Vec<String> = (1..=12).map(|i| format!("line {}", i)).collect();
    let window = request_window().with_content(lines);
    r.render_window(&window, Style::default());

    // 8 interior rows: 7 lines and the marker
    for i in 0..7u16 {
        assert_eq!(text_at(&r, 3 + i, 3, 18).trim_end(), format!("line {}", i + 1));
    }
    assert_eq!(text_at(&r, 10, 3, 18).trim_end(), "...");
    assert_eq!(text_at(&r, 11, 2, 1), "└");
}

#[test]
fn test_title_as_wide_as_window_is_omitted() {
    let mut r = renderer();
    let window = request_window().with_title("t".repeat(20));
    r.render_window(&window, Style::default());
    assert_eq!(text_at(&r, 2, 2, 20), format!("┌{}┐", "─".repeat(18)));

    let mut r = renderer();
    let window = request_window().with_title("t".repeat(19));
    r.render_window(&window, Style::default());
    assert_eq!(text_at(&r, 2, 2, 20), format!("┌{}", "t".repeat(19)));
}

#[test]
fn test_redraw_sends_only_changes() {
    let mut r = renderer();
    r.render_window(&request_window(), Style::default());
    r.show().unwrap();
    r.writer().clear();

    let window = request_window().with_content(["GET /ping", "404 Not Found"]);
    r.render_window(&window, Style::default());
    r.show().unwrap();

    let out = String::from_utf8_lossy(r.writer()).into_owned();
    assert!(out.contains("Not"));
    assert!(out.contains("Found"));
    assert!(!out.contains("GET /ping"));
    assert!(!out.contains("Req"));
}

#[test]
fn test_alternate_buffer_round_trip() {
    let mut r = renderer();
    r.enter_alternate_buffer().unwrap();
    r.render_window(&request_window(), Style::default());
    r.show().unwrap();
    r.exit_alternate_buffer().unwrap();

    let out = String::from_utf8_lossy(r.writer()).into_owned();
    assert!(out.starts_with("\x1b[?1049h\x1b[H"));
    assert!(out.ends_with("\x1b[?1049l"));
    assert!(!r.screen().is_alternate());
}
