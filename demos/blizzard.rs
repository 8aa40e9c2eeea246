use particle_engine::*;

fn main() {
    let mut engine = ParticleEngine::new(WorldConfig::default().with_frame_budget_ms(16.0));
    let bounds = engine.world().level_bounds();

    let mut generators = Vec::new();
    for wall in Platform::level_walls(&bounds, 10.0).into_iter().take(1) {
        generators.push(
            engine
                .world_mut()
                .add_contact_generator(PlatformContactGenerator::new(wall)),
        );
    }
    let floating = [
        Platform::new(Vec3::new(-100.0, -100.0, 0.0), Vec3::new(100.0, 0.0, 0.0), 10.0),
        Platform::new(Vec3::new(100.0, 0.0, 0.0), Vec3::new(250.0, -50.0, 0.0), 10.0),
    ];
    for platform in floating {
        generators.push(
            engine
                .world_mut()
                .add_contact_generator(PlatformContactGenerator::new(platform)),
        );
    }
    generators.push(
        engine
            .world_mut()
            .add_contact_generator(ParticlePairContactGenerator::new()),
    );

    let quarter = bounds.half_extents() / 2.0;
    engine.add_emitter(
        BlizzardEmitter::new(
            Vec3::new(bounds.min.x + quarter.x, bounds.max.y - quarter.y, 0.0),
            1500.0,
        )
        .with_contact_generators(generators.clone()),
    );
    engine.add_emitter(
        BlizzardEmitter::new(
            Vec3::new(bounds.max.x - quarter.x, bounds.max.y - quarter.y, 0.0),
            -1500.0,
        )
        .with_contact_generators(generators),
    );

    for frame in 0..600 {
        engine.update(1.0 / 60.0);
        if frame == 300 {
            // Fan blowing left.
            engine.world_mut().set_acceleration_where(
                |p| p.particle_type() == ParticleType::Snow,
                Vec3::new(-100.0, -5.0, 0.0),
            );
        }
        if frame % 60 == 0 {
            let profile = engine.world().last_profile();
            println!(
                "frame {frame}: {} flakes, {} contacts, {} resolver iterations",
                profile.active_particles, profile.contacts_generated, profile.resolver_iterations
            );
        }
    }

    engine.world().last_profile().report();
    let melted = engine.world_mut().destroy_all_snow();
    println!("cleared {melted} flakes");
}
