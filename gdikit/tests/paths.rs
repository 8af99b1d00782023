//! End-to-end path recording and transformation tests driven through the
//! public device-context API.

use gdikit::dc;
use gdikit::draw;
use gdikit::path::{self, PointType};
use gdikit::pen::{self, PenStyle};
use gdikit::region;
use gdikit::xform::{GraphicsMode, XForm};
use gdikit::{ColorRef, GdiHandle, Point, Status};
use pretty_assertions::assert_eq;

fn advanced_dc() -> GdiHandle {
    let hdc = dc::create_dc().unwrap();
    dc::set_graphics_mode(hdc, GraphicsMode::Advanced);
    hdc
}

/// Record and commit a path with the given drawing calls
fn record(hdc: GdiHandle, draw_calls: impl FnOnce(GdiHandle)) {
    assert!(path::begin_path(hdc));
    draw_calls(hdc);
    assert!(path::end_path(hdc));
}

/// Fetch the committed path
fn fetch(hdc: GdiHandle) -> (Vec<Point>, Vec<PointType>) {
    let count = path::get_path(hdc, &mut [], &mut []);
    assert!(count >= 0);
    let mut points = vec![Point::default(); count as usize];
    let mut tags = vec![PointType::default(); count as usize];
    assert_eq!(path::get_path(hdc, &mut points, &mut tags), count);
    (points, tags)
}

#[test]
fn triangle_records_three_entries() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::move_to(hdc, 0, 0));
        assert!(draw::line_to(hdc, 10, 0));
        assert!(draw::line_to(hdc, 5, 10));
        assert!(path::close_figure(hdc));
    });

    let (points, tags) = fetch(hdc);
    assert_eq!(points, vec![Point::new(0, 0), Point::new(10, 0), Point::new(5, 10)]);
    assert_eq!(
        tags,
        vec![
            PointType::MOVETO,
            PointType::LINETO,
            PointType::LINETO | PointType::CLOSEFIGURE,
        ]
    );
    dc::delete_dc(hdc);
}

#[test]
fn rectangle_in_advanced_mode() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::rectangle(hdc, 0, 0, 10, 10));
    });

    let (points, tags) = fetch(hdc);
    assert_eq!(
        points,
        vec![
            Point::new(10, 0),
            Point::new(0, 0),
            Point::new(0, 10),
            Point::new(10, 10),
        ]
    );
    assert_eq!(
        tags,
        vec![
            PointType::MOVETO,
            PointType::LINETO,
            PointType::LINETO,
            PointType::LINETO | PointType::CLOSEFIGURE,
        ]
    );
    dc::delete_dc(hdc);
}

#[test]
fn degenerate_rectangle_still_records() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::rectangle(hdc, 5, 0, 5, 10));
    });
    assert_eq!(path::get_path(hdc, &mut [], &mut []), 4);
    dc::delete_dc(hdc);
}

#[test]
fn round_rect_records_sixteen_entries() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::round_rect(hdc, 0, 0, 100, 100, 40, 40));
    });

    let (_, tags) = fetch(hdc);
    assert_eq!(tags.len(), 16);
    assert_eq!(tags[0], PointType::MOVETO);
    assert!(tags[15].contains(PointType::CLOSEFIGURE));

    let beziers = tags
        .iter()
        .filter(|t| **t & !PointType::CLOSEFIGURE == PointType::BEZIERTO)
        .count();
    assert_eq!(beziers, 12);
    dc::delete_dc(hdc);
}

#[test]
fn ellipse_records_thirteen_entries() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::ellipse(hdc, 0, 0, 100, 100));
    });

    let (points, tags) = fetch(hdc);
    assert_eq!(tags.len(), 13);
    assert_eq!(tags[0], PointType::MOVETO);
    assert_eq!(points[0], Point::new(0, 50));
    assert_eq!(tags[12], PointType::BEZIERTO | PointType::CLOSEFIGURE);
    dc::delete_dc(hdc);
}

#[test]
fn angle_arc_uses_arcto_semantics() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::move_to(hdc, 50, 50));
        assert!(draw::angle_arc(hdc, 50, 50, 10, 0.0, 90.0));
    });

    let (points, tags) = fetch(hdc);
    assert_eq!(tags.len(), 5);
    // the arc joins the current stroke with a line to its start point
    assert_eq!(tags[0], PointType::MOVETO);
    assert_eq!(tags[1], PointType::LINETO);
    assert_eq!(points[1], Point::new(60, 50));
    assert_eq!(points[4], Point::new(50, 40));
    dc::delete_dc(hdc);
}

#[test]
fn angle_arc_updates_current_position() {
    let hdc = advanced_dc();
    assert!(draw::angle_arc(hdc, 50, 50, 10, 0.0, 90.0));
    assert_eq!(dc::get_current_position(hdc), Point::new(50, 40));
    dc::delete_dc(hdc);
}

#[test]
fn arc_with_empty_box_is_no_op() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::arc(hdc, 5, 0, 5, 10, 5, 0, 5, 10));
    });
    assert_eq!(path::get_path(hdc, &mut [], &mut []), 0);
    dc::delete_dc(hdc);
}

#[test]
fn pie_closes_through_the_centre() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::pie(hdc, 0, 0, 100, 100, 100, 50, 50, 0));
    });

    let (points, tags) = fetch(hdc);
    let last = tags.len() - 1;
    assert_eq!(tags[last], PointType::LINETO | PointType::CLOSEFIGURE);
    assert_eq!(points[last], Point::new(50, 50));
    dc::delete_dc(hdc);
}

#[test]
fn flatten_removes_every_bezier() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::move_to(hdc, 0, 0));
        assert!(draw::poly_bezier_to(
            hdc,
            &[Point::new(0, 50), Point::new(50, 50), Point::new(50, 0)],
        ));
    });

    assert!(draw::flatten_path(hdc));
    let (points, tags) = fetch(hdc);
    assert!(tags
        .iter()
        .all(|t| *t & !PointType::CLOSEFIGURE != PointType::BEZIERTO));
    assert_eq!(points.last(), Some(&Point::new(50, 0)));
    dc::delete_dc(hdc);
}

#[test]
fn flatten_and_region_commute() {
    // to_region(flatten(P)) must equal to_region(P)
    let build = |hdc| {
        record(hdc, |hdc| {
            assert!(draw::ellipse(hdc, 0, 0, 40, 40));
        });
    };

    let hdc1 = advanced_dc();
    build(hdc1);
    let rgn_direct = draw::path_to_region(hdc1);

    let hdc2 = advanced_dc();
    build(hdc2);
    assert!(draw::flatten_path(hdc2));
    let rgn_flat = draw::path_to_region(hdc2);

    let direct = region::get_region(rgn_direct).unwrap();
    let flat = region::get_region(rgn_flat).unwrap();
    assert_eq!(direct.bounds, flat.bounds);
    assert_eq!(direct.rects, flat.rects);

    region::delete_region(rgn_direct);
    region::delete_region(rgn_flat);
    dc::delete_dc(hdc1);
    dc::delete_dc(hdc2);
}

#[test]
fn widen_triangle_produces_closed_figures() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::move_to(hdc, 0, 0));
        assert!(draw::line_to(hdc, 10, 0));
        assert!(draw::line_to(hdc, 5, 10));
        assert!(path::close_figure(hdc));
    });

    let hpen = pen::ext_create_pen(
        PenStyle::GEOMETRIC | PenStyle::ENDCAP_FLAT,
        4,
        ColorRef::BLACK,
    );
    dc::select_object(hdc, hpen);
    assert!(draw::widen_path(hdc));

    let (_, tags) = fetch(hdc);
    // every figure in the widened path is a closed polyline
    let mut start = 0;
    let mut sizes = Vec::new();
    for (i, tag) in tags.iter().enumerate() {
        let base = *tag & !PointType::CLOSEFIGURE;
        assert!(base == PointType::MOVETO || base == PointType::LINETO);
        if tag.contains(PointType::CLOSEFIGURE) {
            sizes.push(i + 1 - start);
            start = i + 1;
        }
    }
    assert_eq!(start, tags.len());
    // the inside offset ring carries two points per original vertex
    assert!(sizes.contains(&6), "expected a six vertex figure, got {:?}", sizes);

    pen::delete_pen(hpen);
    dc::delete_dc(hdc);
}

#[test]
fn widen_rejects_cosmetic_pen() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::rectangle(hdc, 0, 0, 10, 10));
    });

    let hpen = pen::create_pen(PenStyle::SOLID, 4, ColorRef::BLACK);
    dc::select_object(hdc, hpen);
    assert!(!draw::widen_path(hdc));
    assert_eq!(gdikit::last_error(), Status::CanNotComplete);

    pen::delete_pen(hpen);
    dc::delete_dc(hdc);
}

#[test]
fn get_path_probe_undersized_and_round_trip() {
    let hdc = advanced_dc();
    dc::set_world_transform(hdc, &XForm::scale(2.0, 2.0));

    record(hdc, |hdc| {
        assert!(draw::move_to(hdc, 1, 2));
        assert!(draw::line_to(hdc, 3, 4));
    });

    // size probe
    assert_eq!(path::get_path(hdc, &mut [], &mut []), 2);

    // undersized buffers fail
    let mut one_point = [Point::default(); 1];
    let mut one_tag = [PointType::default(); 1];
    assert_eq!(path::get_path(hdc, &mut one_point, &mut one_tag), -1);
    assert_eq!(gdikit::last_error(), Status::InvalidParameter);

    // full copy round-trips through the inverse transform
    let (points, _) = fetch(hdc);
    assert_eq!(points, vec![Point::new(1, 2), Point::new(3, 4)]);
    dc::delete_dc(hdc);
}

#[test]
fn get_path_without_committed_path_fails() {
    let hdc = advanced_dc();
    assert_eq!(path::get_path(hdc, &mut [], &mut []), -1);
    assert_eq!(gdikit::last_error(), Status::CanNotComplete);
    dc::delete_dc(hdc);
}

#[test]
fn end_path_without_recording_fails() {
    let hdc = advanced_dc();
    assert!(!path::end_path(hdc));
    assert_eq!(gdikit::last_error(), Status::CanNotComplete);
    dc::delete_dc(hdc);
}

#[test]
fn abort_path_discards_recording_and_path() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::line_to(hdc, 5, 5));
    });
    assert!(path::abort_path(hdc));
    assert_eq!(path::get_path(hdc, &mut [], &mut []), -1);
    dc::delete_dc(hdc);
}

#[test]
fn poly_polygon_rejects_degenerate_counts() {
    let hdc = advanced_dc();
    assert!(path::begin_path(hdc));
    let pts = [Point::new(0, 0), Point::new(1, 0), Point::new(1, 1)];
    assert!(!draw::poly_polygon(hdc, &pts, &[2, 1]));
    assert!(draw::poly_polygon(hdc, &pts, &[3]));
    assert!(path::end_path(hdc));
    assert_eq!(path::get_path(hdc, &mut [], &mut []), 3);
    dc::delete_dc(hdc);
}

#[test]
fn poly_draw_failure_keeps_current_position() {
    let hdc = advanced_dc();
    assert!(draw::move_to(hdc, 7, 8));
    assert!(path::begin_path(hdc));

    let pts = [Point::new(1, 1), Point::new(2, 2)];
    let tags = [PointType::LINETO, PointType::BEZIERTO];
    assert!(!draw::poly_draw(hdc, &pts, &tags));
    assert_eq!(dc::get_current_position(hdc), Point::new(7, 8));

    path::abort_path(hdc);
    dc::delete_dc(hdc);
}

#[test]
fn path_to_region_covers_the_rectangle_interior() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::rectangle(hdc, 0, 0, 20, 20));
    });

    let hrgn = draw::path_to_region(hdc);
    assert!(hrgn.is_valid());
    let rgn = region::get_region(hrgn).unwrap();
    assert!(rgn.contains_point(Point::new(10, 10)));
    assert!(!rgn.contains_point(Point::new(25, 10)));

    // the path was consumed
    assert_eq!(path::get_path(hdc, &mut [], &mut []), -1);

    region::delete_region(hrgn);
    dc::delete_dc(hdc);
}

#[test]
fn select_clip_path_installs_a_clip_region() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::rectangle(hdc, 0, 0, 10, 10));
    });

    assert!(draw::select_clip_path(hdc, region::CombineMode::Copy));
    let clip = dc::with_dc_mut(hdc, |dc| dc.clip_region).unwrap();
    assert!(clip.is_valid());
    assert!(region::get_region(clip)
        .unwrap()
        .contains_point(Point::new(5, 5)));

    dc::delete_dc(hdc);
}

#[test]
fn fill_and_stroke_consume_the_path() {
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::rectangle(hdc, 0, 0, 10, 10));
    });
    assert!(draw::fill_path(hdc));
    assert!(!draw::fill_path(hdc));
    assert_eq!(gdikit::last_error(), Status::CanNotComplete);
    dc::delete_dc(hdc);
}

#[test]
fn save_restore_preserves_open_recording() {
    let hdc = advanced_dc();
    assert!(path::begin_path(hdc));
    assert!(draw::move_to(hdc, 0, 0));
    assert!(draw::line_to(hdc, 1, 1));

    assert_eq!(dc::save_dc(hdc), 1);
    assert!(draw::line_to(hdc, 2, 2));
    assert!(draw::line_to(hdc, 3, 3));
    assert!(dc::restore_dc(hdc, -1));

    assert!(path::end_path(hdc));
    assert_eq!(path::get_path(hdc, &mut [], &mut []), 2);
    dc::delete_dc(hdc);
}

#[test]
fn poly_bezier_to_moves_the_current_position() {
    let hdc = advanced_dc();
    assert!(path::begin_path(hdc));
    assert!(draw::move_to(hdc, 0, 0));
    assert!(draw::poly_bezier_to(
        hdc,
        &[Point::new(1, 1), Point::new(2, 2), Point::new(9, 9)],
    ));
    assert_eq!(dc::get_current_position(hdc), Point::new(9, 9));
    path::abort_path(hdc);
    dc::delete_dc(hdc);
}

#[test]
fn text_path_records_glyph_outlines() {
    use gdikit::font::{GlyphOutline, POLYGON_TYPE, PRIM_LINE};

    // a 4x4 square glyph outline in 16.16 fixed point
    let mut buf = Vec::new();
    buf.extend_from_slice(&POLYGON_TYPE.to_le_bytes());
    buf.extend_from_slice(&36u32.to_le_bytes()); // header 16 + curve 4 + 2 points
    // start point (0, 0)
    buf.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0]);
    buf.extend_from_slice(&PRIM_LINE.to_le_bytes());
    buf.extend_from_slice(&2u16.to_le_bytes());
    // (4, 0)
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&4i16.to_le_bytes());
    buf.extend_from_slice(&[0, 0, 0, 0]);
    // (4, 4)
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&4i16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&4i16.to_le_bytes());

    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::text_path(
            hdc,
            100,
            100,
            &[GlyphOutline { data: &buf, advance: Point::new(5, 0) }],
        ));
    });

    let (points, tags) = fetch(hdc);
    assert_eq!(tags.len(), 3);
    assert_eq!(points[0], Point::new(100, 100));
    assert_eq!(points[1], Point::new(104, 100));
    assert_eq!(points[2], Point::new(104, 96)); // outline y points up
    assert!(tags[2].contains(PointType::CLOSEFIGURE));
    dc::delete_dc(hdc);
}

#[test]
fn stroke_continuation_across_shapes() {
    // arc-to joins onto the stroke started by line_to, no extra move
    let hdc = advanced_dc();
    record(hdc, |hdc| {
        assert!(draw::move_to(hdc, 0, 50));
        assert!(draw::line_to(hdc, 40, 50));
        assert!(draw::arc_to(hdc, 40, 40, 60, 60, 40, 50, 60, 50));
    });

    let (_, tags) = fetch(hdc);
    let moves = tags
        .iter()
        .filter(|t| **t & !PointType::CLOSEFIGURE == PointType::MOVETO)
        .count();
    assert_eq!(moves, 1);
    dc::delete_dc(hdc);
}
