//! Scripted street scenes for running without a camera or model files

use vision_core::Detection;

/// Scenes in one loop of the demo
pub const SCENE_COUNT: usize = 90;

/// A pedestrian crossing left to right, a car passing the other way during the
/// middle third, and a low-confidence dog the threshold should drop.
pub fn street_scenes(width: u32, height: u32) -> Vec<Vec<Detection>> {
    let (w, h) = (width as f32, height as f32);
    (0..SCENE_COUNT)
        .map(|i| {
            let t = i as f32 / SCENE_COUNT as f32;
            let mut scene = Vec::new();

            let person_w = w * 0.12;
            let person_h = h * 0.45;
            scene.push(Detection::new(
                "person",
                0.75 + 0.2 * (t * std::f32::consts::PI).sin(),
                [t * (w - person_w), h * 0.35, person_w, person_h],
            ));

            if (SCENE_COUNT / 3..2 * SCENE_COUNT / 3).contains(&i) {
                let car_w = w * 0.3;
                let local = (i - SCENE_COUNT / 3) as f32 / (SCENE_COUNT / 3) as f32;
                scene.push(Detection::new(
                    "car",
                    0.82,
                    [(1.0 - local) * (w - car_w), h * 0.55, car_w, h * 0.25],
                ));
            }

            if i % 10 < 3 {
                scene.push(Detection::new(
                    "dog",
                    0.4,
                    [w * 0.7, h * 0.75, w * 0.1, h * 0.1],
                ));
            }
            scene
        })
        .collect()
}
