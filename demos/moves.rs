use console::Style;
use editdiff::{split_lines, LinesDiff};

const OLD: &str = "\
fn helper_one() {
    step_a();
    step_b();
}

fn main() {
    helper_one();
}
";

const NEW: &str = "\
fn main() {
    helper_one();
}

fn helper_one() {
    step_a();
    step_b();
}
";

fn main() {
    let old_lines = split_lines(OLD);
    let new_lines = split_lines(NEW);
    let diff = LinesDiff::configure()
        .compute_moves(true)
        .diff_lines(&old_lines, &new_lines);

    let accent = Style::new().cyan();
    for moved in &diff.moves {
        println!(
            "{}",
            accent.apply_to(format!(
                "lines {}..{} moved to {}..{}",
                moved.original.start,
                moved.original.end,
                moved.modified.start,
                moved.modified.end
            ))
        );
        for change in &moved.changes {
            println!("  changed within the moved block: {}", change);
        }
    }
    for change in &diff.changes {
        println!("changed: {}", change);
    }
}
