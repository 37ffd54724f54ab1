pub mod demo_scene;

pub use demo_scene::DemoScene;
