//! Frame driver: turns session state into emitted frames.
//!
//! One tick advances the camera, extends the page cache, stitches the
//! visible window, rasterizes it, lays the weather over it and hands the
//! result to a sink. Ticks run to completion one after another.

use std::sync::Arc;

use crate::assets::GlyphLibrary;
use crate::biomes::Biome;
use crate::catalog::{SpriteCatalog, SpriteId};
use crate::config::{SceneConfig, SceneGeometry};
use crate::glyphs::SpriteGlyphs;
use crate::noise_field::NoiseField;
use crate::page_cache::{CacheStats, PageCache, PageGenerator};
use crate::render::{OutputGrid, SceneRasterizer};
use crate::seeds::WorldSeeds;
use crate::session::Session;
use crate::sink::{FrameMessage, FrameSink};
use crate::weather::Snowfall;

/// What happened during one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub offset: i64,
    pub biome: Biome,
    pub temperature: f64,
    /// Whether the terrain frame reached the sink
    pub emitted: bool,
    /// Runaway-camera notice delivered this tick, possibly raised earlier
    pub notice: Option<String>,
}

pub struct FrameDriver {
    catalog: Arc<SpriteCatalog>,
    cache: PageCache,
    rasterizer: SceneRasterizer,
    library: GlyphLibrary,
    snow: Snowfall,
}

impl FrameDriver {
    pub fn new(config: &SceneConfig, catalog: Arc<SpriteCatalog>, library: GlyphLibrary) -> Self {
        let seeds = WorldSeeds::from_master(config.world.seed);
        let geometry = config.canvas.geometry();
        let rolls = library.roll_table(&catalog);
        let generator = PageGenerator::new(config, &seeds, Arc::clone(&catalog), rolls);
        Self {
            catalog,
            cache: PageCache::new(generator, &geometry, config.world.cache_radius),
            rasterizer: SceneRasterizer::new(
                geometry,
                NoiseField::new(seeds.noise, seeds.placement),
                config.render.clone(),
            ),
            library,
            snow: Snowfall::new(config.weather.clone(), NoiseField::new(seeds.noise, seeds.weather)),
        }
    }

    pub fn geometry(&self) -> &SceneGeometry {
        self.rasterizer.geometry()
    }

    /// Register glyphs for a sprite whose asset arrived after startup.
    ///
    /// The sprite joins the catalog draws right away: cached pages are
    /// dropped and regenerate with the new set the next time they are seen.
    pub fn add_glyphs(&mut self, id: SpriteId, glyphs: SpriteGlyphs) {
        self.library.insert(id, glyphs);
        self.cache.set_rolls(self.library.roll_table(&self.catalog));
        log::info!("sprite {} is now placeable", id.0);
    }

    pub fn is_placeable(&self, id: SpriteId) -> bool {
        self.cache.rolls().contains(id)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn biome(&self, offset: i64) -> Biome {
        self.cache.classifier().biome(offset)
    }

    pub fn temperature(&self, offset: i64) -> f64 {
        self.cache.classifier().temperature(offset)
    }

    /// Terrain and sprites only, without weather.
    pub fn render_scene(&mut self, offset: i64) -> OutputGrid {
        let (heights, sprites) = self.cache.window(offset);
        self.rasterizer.render(&heights, &sprites, offset, &self.library)
    }

    /// A complete frame with the weather overlay.
    pub fn render_frame(&mut self, offset: i64) -> OutputGrid {
        let mut frame = self.render_scene(offset);
        let temperature = self.temperature(offset);
        self.snow.apply(&mut frame, temperature);
        frame
    }

    /// Advance the session one step and emit the resulting frame.
    ///
    /// A runaway notice stays pending on the session until a sink has taken
    /// it, so a notice raised while the sink was down still arrives later.
    pub fn tick(&mut self, session: &mut Session, sink: &mut dyn FrameSink) -> TickReport {
        session.advance();
        let offset = session.camera().offset;
        let frame = self.render_frame(offset);

        let mut report = TickReport {
            offset,
            biome: self.biome(offset),
            temperature: self.temperature(offset),
            emitted: false,
            notice: None,
        };

        if !sink.is_ready() {
            log::debug!("sink not ready, skipping frame at offset {offset}");
            return report;
        }
        match sink.send(&FrameMessage::ascii(&frame)) {
            Ok(()) => report.emitted = true,
            Err(err) => {
                log::warn!("dropped frame at offset {offset}: {err}");
                return report;
            }
        }
        if let Some(text) = session.pending_notice().map(str::to_owned) {
            match sink.send(&FrameMessage::output(text)) {
                Ok(()) => report.notice = session.take_notice(),
                Err(err) => log::warn!("notice not delivered, will retry: {err}"),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{compile_sprite, SyntheticAssets};
    use crate::config::{CanvasConfig, WorldConfig};
    use crate::error::SinkError;
    use crate::session::ScrollDirection;
    use crate::sink::{FrameKind, JsonLinesSink};

    fn config() -> SceneConfig {
        SceneConfig {
            canvas: CanvasConfig {
                ascii_width: 98,
                ascii_height: 30,
                ..CanvasConfig::default()
            },
            world: WorldConfig {
                runaway_bound: 120,
                ..WorldConfig::default()
            },
            ..SceneConfig::default()
        }
    }

    fn driver() -> FrameDriver {
        FrameDriver::new(&config(), Arc::new(SpriteCatalog::builtin()), GlyphLibrary::default())
    }

    struct OfflineSink {
        attempts: usize,
    }

    impl FrameSink for OfflineSink {
        fn is_ready(&mut self) -> bool {
            false
        }

        fn send(&mut self, _message: &FrameMessage) -> Result<(), SinkError> {
            self.attempts += 1;
            Ok(())
        }
    }

    #[test]
    fn test_tick_emits_terrain_frame() {
        let mut driver = driver();
        let mut session = Session::new(&config().world);
        session.set_direction(ScrollDirection::Right);
        let mut sink = JsonLinesSink::new(Vec::new());

        let report = driver.tick(&mut session, &mut sink);
        assert!(report.emitted);
        assert_eq!(report.offset, 110);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let message: FrameMessage = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(message.kind, FrameKind::Ascii);
        assert_eq!(message.content.lines().count(), 30);
    }

    #[test]
    fn test_unready_sink_is_skipped() {
        let mut driver = driver();
        let mut session = Session::new(&config().world);
        let mut sink = OfflineSink { attempts: 0 };

        let report = driver.tick(&mut session, &mut sink);
        assert!(!report.emitted);
        assert_eq!(sink.attempts, 0);
    }

    #[test]
    fn test_runaway_notice_reaches_the_sink() {
        let mut driver = driver();
        let mut session = Session::new(&config().world);
        session.set_direction(ScrollDirection::Right);
        let mut sink = JsonLinesSink::new(Vec::new());

        // 100 -> 110 -> 120 -> 130 (past the bound)
        let reports: Vec<TickReport> = (0..3).map(|_| driver.tick(&mut session, &mut sink)).collect();
        assert!(reports[2].notice.is_some());
        assert_eq!(session.camera().direction, ScrollDirection::Left);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.lines().last().unwrap().contains(r#""type":"output""#));
    }

    #[test]
    fn test_notice_raised_offline_is_delivered_later() {
        let mut driver = driver();
        let mut world = config().world;
        world.start_offset = 500;
        let mut session = Session::new(&world);
        assert!(session.pending_notice().is_some());

        let mut offline = OfflineSink { attempts: 0 };
        let report = driver.tick(&mut session, &mut offline);
        assert!(report.notice.is_none());
        assert_eq!(offline.attempts, 0);
        assert!(session.pending_notice().is_some());

        let mut sink = JsonLinesSink::new(Vec::new());
        let report = driver.tick(&mut session, &mut sink);
        assert!(report.emitted);
        assert!(report.notice.as_deref().is_some_and(|n| n.contains("turn back left")));
        assert!(session.pending_notice().is_none());

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains(r#""type":"output""#));
    }

    #[test]
    fn test_extreme_offsets_render() {
        let mut driver = driver();
        for offset in [i64::MAX - 5, i64::MIN + 5, i64::MAX, i64::MIN] {
            let frame = driver.render_frame(offset);
            assert_eq!(frame.width(), 98);
            assert_eq!(frame.height(), 30);
        }
    }

    #[test]
    fn test_scene_render_is_one_cache_lookup() {
        let mut driver = driver();
        driver.render_scene(300);
        assert_eq!(driver.cache_stats().hits, 0);
        driver.render_scene(300);
        assert_eq!(driver.cache_stats().hits, 1);
    }

    #[test]
    fn test_late_glyphs_become_placeable() {
        let mut driver = driver();
        let catalog = SpriteCatalog::builtin();
        let (id, def) = catalog.for_biome(Biome::Forest).next().unwrap();
        assert!(!driver.is_placeable(id));

        let cell = driver.geometry().cell;
        let glyphs = compile_sprite(def, &SyntheticAssets::new(cell), cell, &config().glyph).unwrap();
        driver.render_scene(0);
        driver.add_glyphs(id, glyphs);

        assert!(driver.is_placeable(id));
        assert_eq!(driver.cache_stats().page_count, 0);
    }

    #[test]
    fn test_frames_are_reproducible() {
        let mut a = driver();
        let mut b = driver();
        b.render_scene(-500);
        assert_eq!(a.render_scene(77), b.render_scene(77));
    }
}
