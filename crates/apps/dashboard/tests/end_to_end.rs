use dashboard::{Dashboard, DashboardConfig, Snapshot, SnapshotBackend};
use foundation::math::{ProjectionConfig, Vec2, build_projection};
use foundation::{LonLat, LonLatBox, Margins};

const CONUS: LonLatBox = LonLatBox::new(-126.0, 50.0, -66.0, 22.0);

fn snapshot() -> Snapshot {
    serde_json::from_str(
        r#"{
            "boundingBox": {
                "bbox": {"lonMin": -126, "latMax": 50, "lonMax": -66, "latMin": 22},
                "centroid": {"lon": -96, "lat": 37}
            },
            "uiParameters": {"stateVariables": ["qlink1"], "timestamps": ["2019060100"]},
            "mapData": [
                {"linkID": 10, "qlink1": 0.5,
                 "line": {"type": "LineString", "coordinates": [[-90, 38], [-89.8, 38.1], [-89.5, 38.1]]}},
                {"linkID": 11, "qlink1": 12.0,
                 "line": {"type": "LineString", "coordinates": [[-120, 47], [-119.7, 46.8]]}}
            ]
        }"#,
    )
    .unwrap()
}

#[test]
fn padded_conus_corners_land_inside_the_plot() {
    let plot = Margins::new(75.0, 10.0, 10.0, 50.0).plot_rect(800.0, 500.0);
    let fitted = build_projection(
        CONUS,
        Some(LonLat::new(-96.0, 37.0)),
        plot,
        &ProjectionConfig::default(),
    )
    .unwrap();

    for corner in &fitted.ring {
        let p = fitted.projection.project(*corner);
        assert!(p.x >= 75.0 - 1e-9 && p.x <= 790.0 + 1e-9, "x out of plot: {p:?}");
        assert!(p.y >= 10.0 - 1e-9 && p.y <= 450.0 + 1e-9, "y out of plot: {p:?}");
    }
}

#[test]
fn projection_round_trips_inside_the_plot() {
    let plot = Margins::new(75.0, 10.0, 10.0, 50.0).plot_rect(800.0, 500.0);
    let fitted = build_projection(CONUS, None, plot, &ProjectionConfig::default()).unwrap();
    let projection = fitted.projection;
    for i in 0..=10 {
        for j in 0..=10 {
            let p = Vec2::new(
                plot.min[0] + plot.width() * i as f64 / 10.0,
                plot.min[1] + plot.height() * j as f64 / 10.0,
            );
            let back = projection.project(projection.invert(p));
            assert!((back - p).length() < 1e-6, "{p:?} came back as {back:?}");
        }
    }
}

#[tokio::test]
async fn snapshot_renders_a_complete_map() {
    let mut dash = Dashboard::new(SnapshotBackend::new(snapshot()), DashboardConfig::default());
    dash.initialize().await.unwrap();

    let fitted = dash.projection().unwrap();
    let plot = dash.config().map.plot_rect();
    for corner in &fitted.ring {
        let p = fitted.projection.project(*corner);
        assert!(p.x >= plot.min[0] - 1e-9 && p.x <= plot.max[0] + 1e-9);
        assert!(p.y >= plot.min[1] - 1e-9 && p.y <= plot.max[1] + 1e-9);
    }

    let svg = dash.map_svg();
    assert!(svg.starts_with("<?xml"));
    assert_eq!(svg.matches(r#"class="link""#).count(), 2);
    assert!(svg.contains("LATITUDE"));
    assert!(svg.contains("LONGITUDE"));
    assert!(svg.contains("Mean of Analysis for Streamflow"));
    assert!(svg.contains("<title>"));
    assert!(dash.distribution_svg().is_none());
}
