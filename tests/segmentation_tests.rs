//! Annulus segmentation and region routing

mod common;

use image::{GrayImage, Luma};
use rust_iris::segmentation::{EYELID_BAND, RegionSegmenter};
use rust_iris::utils::geometry::angle_v;
use rust_iris::{Circle, RegionName};

#[test]
fn test_corner_centered_complete_region() {
    let img = GrayImage::from_pixel(61, 61, Luma([255]));
    let pupil = Circle::new(0, 0, 10);
    let ext = Circle::new(0, 0, 30);
    let regions = RegionSegmenter::new().segment(&img, &pupil, &ext);

    let complete = &regions[RegionName::Complete];
    assert_eq!(complete.image.dimensions(), (75, 75));
    assert_eq!(complete.ext_circle, Circle::new(37, 37, 30));
    assert_eq!(complete.pupil_circle, Circle::new(37, 37, 10));

    for (u, v, p) in complete.image.enumerate_pixels() {
        let (x, y) = (u as f64 - 37.0, v as f64 - 37.0);
        let r = x.hypot(y);
        if x >= 0.0 && y >= 0.0 && r > 11.0 && r < 29.0 {
            assert_eq!(p[0], 255, "annulus pixel ({}, {})", u, v);
        } else if r < 9.0 || r > 31.0 || x < 0.0 || y < 0.0 {
            assert_eq!(p[0], 0, "outside pixel ({}, {})", u, v);
        }
    }
}

#[test]
fn test_partition_coverage() {
    let img = GrayImage::from_pixel(200, 200, Luma([200]));
    let pupil = Circle::new(100, 100, 20);
    let ext = Circle::new(100, 100, 60);
    let regions = RegionSegmenter::new().segment(&img, &pupil, &ext);
    let (ecx, ecy) = ext.center();

    let mut checked = 0;
    for y in 0..200u32 {
        for x in 0..200u32 {
            let (fx, fy) = (x as f64, y as f64);
            let r = (fx - ecx).hypot(fy - ecy);
            if r < 22.0 || r > 58.0 {
                continue;
            }
            let theta = angle_v(ecx, ecy, fx, fy);
            if theta > EYELID_BAND.0 && theta < EYELID_BAND.1 {
                continue;
            }
            for record in &regions {
                let (cx, cy) = record.name.canonical_center(ext.radius);
                let tx = x as i64 + (cx - ext.center_x) as i64;
                let ty = y as i64 + (cy - ext.center_y) as i64;
                if tx < 0 || ty < 0 || tx >= record.image.width() as i64 || ty >= record.image.height() as i64 {
                    assert!(
                        !record.name.contains_pixel_angle(theta),
                        "{} pixel at {:.1} deg falls off its canvas",
                        record.name,
                        theta
                    );
                    continue;
                }
                let value = record.image.get_pixel(tx as u32, ty as u32)[0];
                assert_eq!(
                    value != 0,
                    record.name.contains_pixel_angle(theta),
                    "{} at ({}, {}), theta {:.2}",
                    record.name,
                    x,
                    y,
                    theta
                );
                checked += 1;
            }
        }
    }
    assert!(checked > 0);
}

#[test]
fn test_band_edges_are_inclusive() {
    assert!(RegionName::RightSide.contains_pixel_angle(50.0));
    assert!(RegionName::RightSide.contains_pixel_angle(-50.0));
    assert!(RegionName::LeftSide.contains_pixel_angle(130.0));
    assert!(RegionName::LeftSide.contains_pixel_angle(-180.0));
    assert!(RegionName::Bottom.contains_pixel_angle(-40.0));
    assert!(!RegionName::Bottom.contains_pixel_angle(-39.9));
    assert!(RegionName::Complete.contains_pixel_angle(90.0));
}

#[test]
fn test_eye_regions_keep_canvas_sizes() {
    let img = common::synthetic_eye(5);
    let (pupil, ext) = common::eye_circles();
    let regions = RegionSegmenter::new().segment(&img, &pupil, &ext);
    assert_eq!(regions[RegionName::RightSide].image.dimensions(), (87, 175));
    assert_eq!(regions[RegionName::LeftSide].image.dimensions(), (87, 175));
    assert_eq!(regions[RegionName::Bottom].image.dimensions(), (175, 87));
    assert_eq!(regions[RegionName::Complete].image.dimensions(), (175, 175));
    assert!(regions.validate().is_ok());
}
