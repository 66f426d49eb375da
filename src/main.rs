//! Главный исполняемый файл: демонстрация сборки и обучения сетей.

use clap::Parser;
use rand::SeedableRng;

use rustynet::optimizers::{Optimizer, Sgd};
use rustynet::shortcuts::{build_network, BuildOptions};
use rustynet::structure::{
    build_swiping_network, LinearLayer, ModuleMesh, NetworkBuilder, SwipingOptions, TanhLayer,
};

/// Аргументы командной строки
#[derive(Parser, Debug)]
#[command(author, version, about = "rustynet: buffer-based neural networks", long_about = None)]
struct Args {
    /// Построить двумерную swiping-решётку и напечатать её структуру
    #[arg(long)]
    swiping: bool,

    /// Включить GUI-визуализацию решётки (требует feature "viz")
    #[arg(short, long)]
    visualize: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.visualize {
        return run_visualization();
    }
    if args.swiping {
        return run_swiping_demo();
    }
    run_xor_training()
}

/// Обучение сети из трёх слоёв на функции XOR обычным backprop.
fn run_xor_training() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Демонстрация обучения rustynet: XOR ---");

    let samples: [([f32; 2], f32); 4] = [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ];

    let mut net = build_network(&[2, 4, 1], BuildOptions::default())?;
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    net.randomize(&mut rng);
    println!("[1] Сеть собрана: {} параметров.", net.total_parameters());

    let mut sgd = Sgd::with_momentum(0.2, 0.9);
    for epoch in 0..2000 {
        let mut loss = 0.0;
        for (input, target) in &samples {
            net.reset();
            let out = net.activate(input)?;
            let err = out[0] - target;
            loss += 0.5 * err * err;
            net.back_activate(&[err])?;
        }
        sgd.step(&mut net);
        if epoch % 200 == 0 {
            println!("[Epoch {:4}] loss = {:.6}", epoch, loss);
        }
    }

    println!("[2] Итоговые предсказания:");
    for (input, target) in &samples {
        net.reset();
        let out = net.activate(input)?;
        println!("    {:?} -> {:.3} (ожидалось {})", input, out[0], target);
    }
    Ok(())
}

/// Сборка двумерной swiping-решётки 3x3 и печать её структуры.
fn run_swiping_demo() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Демонстрация swiping-решётки 3x3 ---");

    let mut builder = NetworkBuilder::new("swiping-demo");
    let inmesh = ModuleMesh::build(&mut builder, "in", &[3, 3], |c| {
        Box::new(LinearLayer::new(1, format!("in{:?}", c)))
    })?;
    let outmesh = ModuleMesh::build(&mut builder, "out", &[3, 3], |c| {
        Box::new(LinearLayer::new(1, format!("out{:?}", c)))
    })?;
    let hiddenmesh = ModuleMesh::build(&mut builder, "hidden", &[3, 3, 4], |c| {
        Box::new(TanhLayer::new(2, format!("h{:?}", c)))
    })?;

    let net = build_swiping_network(
        builder,
        &inmesh,
        &hiddenmesh,
        &outmesh,
        SwipingOptions::default(),
    )?;

    println!(
        "Модулей: {}, прямых связей: {}, параметров: {}",
        net.modules().len(),
        net.connections().len(),
        net.total_parameters()
    );
    println!("{}", net);
    Ok(())
}

#[cfg(feature = "viz")]
fn run_visualization() -> Result<(), Box<dyn std::error::Error>> {
    use rustynet::viewer::{run_viewer, SharedScene};
    use std::thread;
    use std::time::{Duration, Instant};

    println!("[GUI] Запуск визуализатора в основном потоке...");
    let scene = SharedScene::new();
    scene.set_target([8.0, 0.0, 0.0]);

    // Синтетическая "физика": куб из восьми точек, дышащий по синусу
    let producer = scene.clone();
    thread::spawn(move || {
        let started = Instant::now();
        loop {
            let t = started.elapsed().as_secs_f32();
            let scale = 40.0 + 10.0 * t.sin();
            let mut points = Vec::with_capacity(8);
            let mut sensors = Vec::with_capacity(8);
            for i in 0..8u32 {
                let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
                let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
                let sz = if i & 4 == 0 { -1.0 } else { 1.0 };
                points.push([sx * scale + t.cos() * 20.0, sy * scale, sz * scale]);
                sensors.push((t + i as f32).sin());
            }
            producer.update_data(&points, &sensors);
            thread::sleep(Duration::from_millis(40));
        }
    });

    run_viewer(scene)?;
    Ok(())
}

#[cfg(not(feature = "viz"))]
fn run_visualization() -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Визуализация недоступна: соберите с --features viz");
    Ok(())
}
