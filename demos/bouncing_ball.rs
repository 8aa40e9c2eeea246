use particle_engine::*;

fn main() {
    let mut world = ParticleWorld::new(WorldConfig::default().with_pool_size(1));
    let ground =
        world.add_contact_generator(GroundContactGenerator::new(0.0).with_restitution(0.5));

    let Some(ball) = world.get_new_particle() else {
        return;
    };
    if let Some(particle) = world.particle_mut(ball) {
        particle.set_position(Vec3::new(0.0, 10.0, 0.0));
        particle.set_acceleration(Vec3::new(0.0, -10.0, 0.0));
        particle.set_damping(1.0);
        particle.set_particle_type(ParticleType::Ball);
    }
    if let Some(generator) = world.contact_generator_mut(ground) {
        generator.add_particle(ball);
    }

    let dt = 0.1;
    for step in 1..=40 {
        world.step(dt);
        if let Some(particle) = world.particle(ball) {
            println!(
                "t = {:.1}s  y = {:>6.2}  vy = {:>6.2}",
                step as f32 * dt,
                particle.position().y,
                particle.velocity().y
            );
        }
    }
}
