use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use replex::models::DoubleWell;
use replex::{Ensemble, MonteCarloStep, RunReport};

fn right_align(table: &mut Table, from: usize, to: usize) {
    for i in from..=to {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

pub fn print_ladder(temperatures: &[f64]) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Pos").add_attribute(Attribute::Bold),
        Cell::new("T").fg(Color::Cyan),
        Cell::new("Beta"),
    ]);
    right_align(&mut table, 0, 2);

    for (i, &t) in temperatures.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i),
            Cell::new(format!("{:.4}", t)).fg(Color::Cyan),
            Cell::new(format!("{:.4}", 1.0 / t)),
        ]);
    }
    println!("\n{}", table);
}

pub fn print_exchange_report(report: &RunReport) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Pair").add_attribute(Attribute::Bold),
        Cell::new("T lo"),
        Cell::new("T hi"),
        Cell::new("Tried"),
        Cell::new("Acc").fg(Color::Green),
        Cell::new("Ratio").fg(Color::Cyan),
        Cell::new("<P>"),
    ]);
    right_align(&mut table, 1, 6);

    for p in &report.pairs {
        let t_lo = report.temperatures.get(p.lower).copied().unwrap_or(f64::NAN);
        let t_hi = report.temperatures.get(p.upper).copied().unwrap_or(f64::NAN);
        let ratio = p.acceptance_ratio.unwrap_or(0.0);

        // Pairs that never swap cut the ladder in two.
        let ratio_color = if p.attempted > 0 && p.accepted == 0 {
            Color::Red
        } else {
            Color::Cyan
        };

        table.add_row(vec![
            Cell::new(format!("{}-{}", p.lower, p.upper)).add_attribute(Attribute::Bold),
            Cell::new(format!("{:.3}", t_lo)),
            Cell::new(format!("{:.3}", t_hi)),
            Cell::new(p.attempted),
            Cell::new(p.accepted).fg(Color::Green),
            Cell::new(format!("{:.3}", ratio)).fg(ratio_color),
            Cell::new(format!("{:.3}", p.average_probability.unwrap_or(0.0))),
        ]);
    }
    println!("\n{}", table);

    let tried = report.stats.total_attempted();
    let accepted = report.stats.total_accepted();
    let overall = if tried > 0 {
        accepted as f64 / tried as f64
    } else {
        0.0
    };
    println!(
        "Rounds: {} | Swaps: {}/{} ({:.1}%) | Steps: {} | Stop: {} | {:.2}s",
        report.rounds,
        accepted,
        tried,
        overall * 100.0,
        report.steps_completed,
        report.stop_reason,
        report.elapsed_secs
    );
}

pub fn print_replica_table(ensemble: &Ensemble<DoubleWell>) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Pos").add_attribute(Attribute::Bold),
        Cell::new("T").fg(Color::Cyan),
        Cell::new("Energy"),
        Cell::new("Config"),
        Cell::new("Right wells"),
        Cell::new("MC acc"),
    ]);
    right_align(&mut table, 0, 5);

    for (pos, r) in ensemble.replicas().iter().enumerate() {
        let walker = ensemble.order().get(pos).copied().unwrap_or(pos);
        let system = r.system();
        let right = system.position.iter().filter(|&&x| x > 0.0).count();
        let mc_ratio = if r.steps() > 0 {
            system.accepted as f64 / r.steps() as f64
        } else {
            0.0
        };

        table.add_row(vec![
            Cell::new(pos),
            Cell::new(format!("{:.3}", r.temperature())).fg(Color::Cyan),
            Cell::new(format!("{:.4}", system.potential_energy())),
            Cell::new(format!("#{}", walker)),
            Cell::new(format!("{}/{}", right, system.position.len())),
            Cell::new(format!("{:.3}", mc_ratio)),
        ]);
    }
    println!("\n{}", table);
}
