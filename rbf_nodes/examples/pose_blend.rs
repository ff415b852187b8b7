use rbf_nodes::{PoseProperty, RbfNode, SolverSettings, progress::closure_sink};
use rbf_nodes_utils::KernelType;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Print solver progress from a listener thread
    let (sink, listener) = closure_sink(16, |msg| println!("{msg:?}"));

    // Shoulder rotation (x, z) drives two corrective shape keys
    let settings = SolverSettings::builder(KernelType::Gaussian2)
        .allow_negative_weights(false)
        .build();
    let mut node = RbfNode::builder("shoulder_correctives", settings)
        .progress_callback(sink)
        .build();

    let poses = [
        ([0.0, 0.0], [0.0, 0.0]),
        ([1.2, 0.0], [1.0, 0.0]),
        ([0.0, 1.2], [0.0, 1.0]),
        ([1.2, 1.2], [0.6, 0.6]),
    ];

    for (drivers, driven) in poses {
        node.add_pose(
            vec![
                PoseProperty::new("pose.bones[\"shoulder\"].rotation_euler[0]", drivers[0]),
                PoseProperty::new("pose.bones[\"shoulder\"].rotation_euler[2]", drivers[1]),
            ],
            vec![
                PoseProperty::new("key_blocks[\"raise\"].value", driven[0]).with_original(0.0),
                PoseProperty::new("key_blocks[\"forward\"].value", driven[1]).with_original(0.0),
            ],
        );
    }

    // Solve the RBF weights
    node.activate()?;

    // Sweep the shoulder between the rest pose and the raised pose
    for step in 0..=4 {
        let x = 1.2 * step as f64 / 4.0;
        if let Some(values) = node.evaluate(&[x, 0.3]) {
            println!("rotation ({x:.2}, 0.30) -> raise {:.3}, forward {:.3}", values[0], values[1]);
        }
    }

    // Persist the solved model
    let path = std::env::temp_dir().join("shoulder_correctives.json");
    node.save_model(&path)?;
    println!("model saved to {}", path.display());

    // Dropping the node drops the last sink handle and stops the listener
    drop(node);
    let _ = listener.join();

    Ok(())
}
