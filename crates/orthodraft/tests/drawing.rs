//! End-to-end drawing scenarios across projection, classification and layout.

use std::sync::Arc;

use orthodraft::{
    project_shape, AxisDir, Axonometric, AxonometricStyle, CategoryMask, ComposerState,
    DraftError, DraftSettings, DrawingConfig, DuplicatePolicy, EdgeCategory, EdgeKind,
    LayoutParams, ProjectionConvention, SecondaryRequest, Shape, ViewComposer, ViewSlot,
    ViewSpec, Visibility,
};
use orthodraft_math::Point3;
use orthodraft_primitives::{make_box, make_cone, make_cylinder, make_slot, make_sphere};

fn cube() -> Arc<Shape> {
    Arc::new(make_box(10.0, 10.0, 10.0).unwrap())
}

/// Every cardinal view, each with some perpendicular axis to the right.
fn cardinal_specs() -> Vec<ViewSpec> {
    let pairs = [
        (AxisDir::PosX, AxisDir::PosY),
        (AxisDir::NegX, AxisDir::NegY),
        (AxisDir::PosY, AxisDir::NegX),
        (AxisDir::NegY, AxisDir::PosX),
        (AxisDir::PosZ, AxisDir::PosX),
        (AxisDir::NegZ, AxisDir::PosX),
    ];
    pairs
        .into_iter()
        .map(|(view_from, right)| ViewSpec::Cardinal { view_from, right })
        .collect()
}

fn all_secondaries() -> Vec<SecondaryRequest> {
    let mut out: Vec<SecondaryRequest> = [
        ViewSlot::Top,
        ViewSlot::Bottom,
        ViewSlot::Left,
        ViewSlot::Right,
        ViewSlot::Rear,
    ]
    .into_iter()
    .map(|slot| SecondaryRequest::Relative { slot })
    .collect();
    out.extend(ViewSlot::CORNERS.into_iter().map(|corner| SecondaryRequest::Axonometric {
        corner,
        params: Axonometric::isometric(),
    }));
    out
}

#[test]
fn cube_along_every_axis_has_four_visible_and_four_hidden_edges() {
    let shape = cube();
    for spec in cardinal_specs() {
        let view = project_shape(shape.clone(), &spec, &DraftSettings::default()).unwrap();
        assert_eq!(view.count(EdgeCategory::SharpVisible), 4, "{spec:?}");
        assert_eq!(view.count(EdgeCategory::SharpHidden), 4, "{spec:?}");
        assert_eq!(view.edges.len(), 8, "{spec:?}");
        assert!(view.edges.iter().all(|e| e.kind == EdgeKind::Sharp));
        assert!(view
            .edges
            .iter()
            .all(|e| e.is_fully_visible() || e.is_fully_hidden()));
        assert!((view.bounds.width() - 10.0).abs() < 1e-9);
        assert!((view.bounds.height() - 10.0).abs() < 1e-9);
    }
}

#[test]
fn sphere_has_one_visible_outline_from_any_direction() {
    let shape = Arc::new(make_sphere(Point3::new(3.0, -1.0, 2.0), 4.0).unwrap());
    let mut specs = cardinal_specs();
    specs.push(ViewSpec::Axonometric(Axonometric::isometric()));
    specs.push(ViewSpec::Axonometric(Axonometric {
        style: AxonometricStyle::Trimetric,
        flip: true,
        ..Default::default()
    }));
    specs.push(ViewSpec::Free {
        normal: [1.0, 2.0, 3.0],
        up: [0.0, 0.0, 1.0],
    });
    for spec in specs {
        let view = project_shape(shape.clone(), &spec, &DraftSettings::default()).unwrap();
        assert_eq!(view.edges.len(), 1, "{spec:?}");
        assert_eq!(view.count(EdgeCategory::OutlineVisible), 1, "{spec:?}");
        assert!(view.diagnostics.is_empty(), "{spec:?}");
    }
}

#[test]
fn projection_is_deterministic() {
    let settings = DraftSettings {
        iso_count: 3,
        ..Default::default()
    };
    let shapes = [
        Arc::new(make_slot(30.0, 10.0, 5.0).unwrap()),
        Arc::new(make_cone(6.0, 2.0, 9.0).unwrap()),
    ];
    let spec = ViewSpec::Axonometric(Axonometric {
        style: AxonometricStyle::Dimetric,
        ..Default::default()
    });
    for shape in shapes {
        let a = project_shape(shape.clone(), &spec, &settings).unwrap();
        let b = project_shape(shape, &spec, &settings).unwrap();
        let json_a = serde_json::to_string(&a).unwrap();
        let json_b = serde_json::to_string(&b).unwrap();
        assert_eq!(json_a, json_b);
    }
}

#[test]
fn visibility_runs_partition_every_curve() {
    let settings = DraftSettings {
        iso_count: 2,
        ..Default::default()
    };
    let shapes = [
        Arc::new(make_cylinder(4.0, 9.0).unwrap()),
        Arc::new(make_slot(20.0, 8.0, 6.0).unwrap()),
        Arc::new(make_cone(5.0, 0.0, 8.0).unwrap()),
    ];
    let spec = ViewSpec::Axonometric(Axonometric::isometric());
    for shape in shapes {
        let view = project_shape(shape, &spec, &settings).unwrap();
        for edge in &view.edges {
            assert!(!edge.segments.is_empty());
            assert_eq!(edge.segments[0].range.0, edge.range.0);
            assert_eq!(edge.segments.last().unwrap().range.1, edge.range.1);
            for pair in edge.segments.windows(2) {
                assert_eq!(pair[0].range.1, pair[1].range.0);
                assert!(pair[0].range.0 < pair[0].range.1);
            }
            for seg in &edge.segments {
                assert_eq!(seg.category, EdgeCategory::new(edge.kind, seg.visibility));
                assert!(seg.points.len() >= 2);
            }
        }
    }
}

#[test]
fn slot_tangent_edges_become_outlines_in_the_side_view() {
    let shape = Arc::new(make_slot(30.0, 10.0, 5.0).unwrap());
    let side = ViewSpec::Cardinal {
        view_from: AxisDir::PosX,
        right: AxisDir::PosY,
    };
    let view = project_shape(shape.clone(), &side, &DraftSettings::default()).unwrap();
    assert_eq!(view.edges_of_kind(EdgeKind::Outline).count(), 4);
    assert_eq!(view.edges_of_kind(EdgeKind::Smooth).count(), 0);

    let top = ViewSpec::Cardinal {
        view_from: AxisDir::PosZ,
        right: AxisDir::PosX,
    };
    let view = project_shape(shape, &top, &DraftSettings::default()).unwrap();
    assert_eq!(view.edges_of_kind(EdgeKind::Outline).count(), 0);
}

#[test]
fn category_mask_filters_hidden_lines() {
    let view = project_shape(cube(), &ViewSpec::front(), &DraftSettings::default()).unwrap();
    assert_eq!(view.polylines(&CategoryMask::all()).count(), 8);
    let visible: Vec<_> = view.polylines(&CategoryMask::visible_only()).collect();
    assert_eq!(visible.len(), 4);
    assert!(visible
        .iter()
        .all(|(category, _)| category.visibility() == Visibility::Visible));
}

fn slot_drawing(flags: &str) -> orthodraft::Drawing {
    let text = format!(
        r#"
[shape]
type = "slot"
length = 20.0
width = 8.0
height = 6.0

[[secondaries]]
type = "cardinal"
axis = "pos_z"

[settings]
{flags}
"#
    );
    DrawingConfig::from_toml_str(&text).unwrap().compose().unwrap()
}

fn count_segments(drawing: &orthodraft::Drawing, keep: impl Fn(EdgeCategory) -> bool) -> usize {
    drawing
        .views
        .iter()
        .flat_map(|v| &v.edges)
        .flat_map(|e| &e.segments)
        .filter(|s| keep(s.category))
        .count()
}

#[test]
fn display_flags_drop_hidden_and_smooth_runs() {
    let hidden = |c: EdgeCategory| c.visibility() == Visibility::Hidden;
    let smooth = |c: EdgeCategory| c.kind() == EdgeKind::Smooth;

    let full = slot_drawing("");
    assert!(count_segments(&full, hidden) > 0);
    assert!(count_segments(&full, smooth) > 0);

    let plain = slot_drawing("show_hidden = false\nshow_smooth = false");
    assert_eq!(count_segments(&plain, hidden), 0);
    assert_eq!(count_segments(&plain, smooth), 0);
    assert!(count_segments(&plain, |c| c == EdgeCategory::SharpVisible) > 0);
    for (a, b) in full.views.iter().zip(&plain.views) {
        assert_eq!(a.bounds, b.bounds);
    }
    let json = serde_json::to_string(&plain).unwrap();
    assert!(!json.contains("SharpHidden"));
}

#[test]
fn auto_layout_never_overlaps_with_positive_spacing() {
    for spacing in [0.5, 5.0, 20.0] {
        let mut composer = ViewComposer::new(
            Arc::new(make_box(40.0, 25.0, 10.0).unwrap()),
            DraftSettings::default(),
        )
        .unwrap();
        composer.set_primary(&ViewSpec::front()).unwrap();
        composer.add_secondaries(&all_secondaries()).unwrap();
        let params = LayoutParams {
            spacing_x: spacing,
            spacing_y: spacing,
            ..Default::default()
        };
        let layout = composer.layout(&params).unwrap();
        assert_eq!(layout.placements.len(), 10);
        assert!(!layout.has_overlap(), "spacing {spacing}");
        for (i, a) in layout.placements.iter().enumerate() {
            for b in &layout.placements[i + 1..] {
                assert_eq!(a.page_bounds.overlap_area(&b.page_bounds), 0.0);
            }
        }
    }
}

#[test]
fn layout_is_idempotent() {
    let mut composer = ViewComposer::new(cube(), DraftSettings::default()).unwrap();
    composer.set_primary(&ViewSpec::front()).unwrap();
    composer
        .add_secondary(SecondaryRequest::Cardinal { axis: AxisDir::PosX })
        .unwrap();
    let params = LayoutParams::default();
    let first = composer.layout(&params).unwrap().clone();
    let views: Vec<_> = composer.views().cloned().collect();
    let second = composer.layout(&params).unwrap().clone();
    assert_eq!(first, second);
    assert_eq!(views, composer.views().cloned().collect::<Vec<_>>());
}

#[test]
fn convention_round_trip_restores_placement() {
    let mut composer = ViewComposer::new(
        Arc::new(make_cylinder(5.0, 12.0).unwrap()),
        DraftSettings::default(),
    )
    .unwrap();
    composer.set_primary(&ViewSpec::front()).unwrap();
    composer.add_secondaries(&all_secondaries()).unwrap();
    let third = composer.layout(&LayoutParams::default()).unwrap().clone();
    let views: Vec<_> = composer.views().map(|v| v.edges.clone()).collect();

    composer
        .set_convention(ProjectionConvention::FirstAngle)
        .unwrap();
    assert_eq!(composer.state(), ComposerState::LaidOut);
    let first = composer.current_layout().unwrap().clone();
    let top = first.placement(ViewSlot::Top).unwrap();
    let primary = first.placement(ViewSlot::Primary).unwrap();
    assert_eq!(top.cell, (0, -1));
    assert!(top.page_bounds.min_y > primary.page_bounds.max_y);
    assert_eq!(
        first.placement(ViewSlot::TopLeft).unwrap().cell,
        third.placement(ViewSlot::TopLeft).unwrap().cell
    );

    composer
        .set_convention(ProjectionConvention::ThirdAngle)
        .unwrap();
    assert_eq!(composer.current_layout().unwrap(), &third);
    let after: Vec<_> = composer.views().map(|v| v.edges.clone()).collect();
    assert_eq!(views, after);
}

#[test]
fn duplicate_secondary_is_replaced() {
    let mut composer = ViewComposer::new(cube(), DraftSettings::default()).unwrap();
    assert_eq!(composer.duplicate_policy(), DuplicatePolicy::Replace);
    composer.set_primary(&ViewSpec::front()).unwrap();
    let a = composer
        .add_secondary(SecondaryRequest::Cardinal { axis: AxisDir::PosZ })
        .unwrap();
    let before = composer.view(a).unwrap().clone();
    let b = composer
        .add_secondary(SecondaryRequest::Relative { slot: ViewSlot::Top })
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(composer.views().count(), 2);
    assert_eq!(composer.view(b).unwrap(), &before);
}

#[test]
fn duplicate_secondary_is_rejected() {
    let mut composer = ViewComposer::new(cube(), DraftSettings::default()).unwrap();
    composer.set_duplicate_policy(DuplicatePolicy::Reject);
    composer.set_primary(&ViewSpec::front()).unwrap();
    composer
        .add_secondary(SecondaryRequest::Cardinal { axis: AxisDir::PosZ })
        .unwrap();
    let err = composer
        .add_secondary(SecondaryRequest::Cardinal { axis: AxisDir::PosZ })
        .unwrap_err();
    assert!(matches!(err, DraftError::DuplicateView(ViewSlot::Top)));
    assert_eq!(composer.views().count(), 2);

    let batch = [
        SecondaryRequest::Cardinal { axis: AxisDir::PosX },
        SecondaryRequest::Relative { slot: ViewSlot::Right },
    ];
    assert!(matches!(
        composer.add_secondaries(&batch),
        Err(DraftError::DuplicateView(ViewSlot::Right))
    ));
    assert!(composer.view(ViewSlot::Right).is_none());
}

#[test]
fn drawing_from_toml() {
    let config = DrawingConfig::from_toml_str(
        r#"
convention = "first_angle"

[shape]
type = "cone"
radius_bottom = 6.0
radius_top = 3.0
height = 10.0

[[secondaries]]
type = "cardinal"
axis = "pos_z"

[[secondaries]]
type = "axonometric"
corner = "bottom_right"
params = { style = "dimetric", tilt = 0.3 }

[layout]
spacing_x = 10.0
spacing_y = 10.0
"#,
    )
    .unwrap();
    let drawing = config.compose().unwrap();
    assert_eq!(drawing.views.len(), 3);
    assert_eq!(drawing.stats.faces, 3);
    let layout = drawing.layout.unwrap();
    assert_eq!(layout.convention, ProjectionConvention::FirstAngle);
    assert!(layout.warnings.is_empty());
    let slots: Vec<_> = layout.placements.iter().map(|p| p.slot).collect();
    assert_eq!(
        slots,
        vec![ViewSlot::Primary, ViewSlot::Top, ViewSlot::BottomRight]
    );
}

#[test]
fn demo_descriptions_compose() {
    for text in [
        include_str!("../../../demos/bracket.toml"),
        include_str!("../../../demos/shaft.toml"),
    ] {
        let config = DrawingConfig::from_toml_str(text).unwrap();
        let drawing = config.compose().unwrap();
        assert_eq!(drawing.views.len(), 1 + config.secondaries.len());
        assert!(!drawing.layout.unwrap().has_overlap());
    }
}
