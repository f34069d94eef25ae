//! End-of-run statistics.

use dispatcher::RunReport;

/// Print the run summary and the final message count
pub fn print_run_report(report: &RunReport) {
    println!("\n=== Forwarder Statistics ===\n");
    println!("Sent: {}", report.sent);
    println!("Replayed from spool: {}", report.replayed);
    println!("Spooled on exit: {}", report.spooled);
    println!();
    print!("{}", report.summary);
    println!();
    println!("sendcnt num {}", report.sent);
}
