//! Run with: cargo run --package server --bin generate-types --features typescript

use std::fs;
use std::path::Path;

fn main() {
    println!("Generating TypeScript types...");

    let out_dir = Path::new("frontend/src/types/generated");

    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    #[cfg(feature = "typescript")]
    {
        use ts_rs::TS;

        bpa_core::PartnerApi::export_all_to(out_dir).expect("Failed to export PartnerApi");
        bpa_core::ConnectionState::export_all_to(out_dir).expect("Failed to export ConnectionState");
        bpa_core::Activity::export_all_to(out_dir).expect("Failed to export Activity");
        bpa_core::ActivityLink::export_all_to(out_dir).expect("Failed to export ActivityLink");
        bpa_core::TaskState::export_all_to(out_dir).expect("Failed to export TaskState");

        events::WebSocketMessageBody::export_all_to(out_dir)
            .expect("Failed to export WebSocketMessageBody");
        events::WebSocketMessageType::export_all_to(out_dir)
            .expect("Failed to export WebSocketMessageType");

        server::routes::AcceptedResponse::export_all_to(out_dir)
            .expect("Failed to export AcceptedResponse");
    }

    println!("TypeScript types generated in {}", out_dir.display());
}
