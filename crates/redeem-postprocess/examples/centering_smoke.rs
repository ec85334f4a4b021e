use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use redeem_postprocess::stats::bin_class_means;
use redeem_postprocess::{postprocess, FeatureKind, UniformOracle};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let n = 1000;
    let d = 2;
    let k = 3;
    let b = 10;

    let mut rng = StdRng::seed_from_u64(42);
    let binned = Array2::from_shape_fn((n, d), |_| rng.gen_range(0..b));
    let feature_graphs: Vec<Array2<f64>> = (0..d)
        .map(|_| Array2::from_shape_fn((b, k), |_| rng.gen::<f64>()))
        .collect();
    let feature_kinds = vec![FeatureKind::Numeric; d];

    println!("Synthetic binned shape: {:?}", binned.dim());

    let results = postprocess(&binned, &feature_graphs, &UniformOracle::new(k), &feature_kinds)?;

    for (feature, graph) in results.feature_graphs.iter().enumerate() {
        println!(
            "test for centering, feature {}: {}",
            feature,
            bin_class_means(graph)
        );
    }
    println!("intercepts: {}", results.intercepts);

    Ok(())
}
