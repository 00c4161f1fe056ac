//! Shared fixtures for command tests: a minimal on-disk project with one
//! tile of fabric, a three-port design and a fast annealing schedule.

use std::path::Path;

/// `fabric/fabric_cells.yaml` of the fixture project.
pub const FABRIC_CELLS_YAML: &str = r#"
fabric_cells_by_tile:
  tiles:
    T0_0:
      cells:
        - { name: T0_0_R0_NAND2_0, x: 12.0, y: 10.0 }
        - { name: T0_0_R0_NAND2_1, x: 16.0, y: 10.0 }
        - { name: T0_0_R1_DFBBP_0, x: 12.0, y: 12.72 }
        - { name: T0_0_R2_CLKBUF_0, x: 12.0, y: 15.44 }
        - { name: T0_0_R3_CONB_0, x: 12.0, y: 18.16 }
"#;

/// `fabric/pins.yaml` of the fixture project.
pub const PINS_YAML: &str = r#"
pin_placement:
  die_area_um: { width: 60.0, height: 60.0 }
  core_margin_um: 5.0
  units: { dbu_per_micron: 1000 }
  pins:
    - { name: in1, direction: input, x_um: 0.0, y_um: 20.0, layer: met2, side: west }
    - { name: clk, direction: input, x_um: 0.0, y_um: 40.0, layer: met2, side: west }
    - { name: out1, direction: output, x_um: 60.0, y_um: 30.0, layer: met2, side: east }
"#;

/// `fabric/fabric.yaml` of the fixture project.
pub const FABRIC_YAML: &str = r#"
cell_definitions:
  sky130_fd_sc_hd__nand2_2: { width_sites: 3 }
  sky130_fd_sc_hd__dfbbp_1: { width_sites: 10 }
  sky130_fd_sc_hd__clkbuf_4: { width_sites: 4 }
  sky130_fd_sc_hd__conb_1: { width_sites: 2 }
fabric_info:
  site_dimensions_um: { width: 0.46, height: 2.72 }
tile_definition:
  dimensions_sites: { width: 60, height: 4 }
  cells:
    - { template_name: R0_NAND2_0, cell_type: sky130_fd_sc_hd__nand2_2 }
    - { template_name: R0_NAND2_1, cell_type: sky130_fd_sc_hd__nand2_2 }
    - { template_name: R1_DFBBP_0, cell_type: sky130_fd_sc_hd__dfbbp_1 }
    - { template_name: R2_CLKBUF_0, cell_type: sky130_fd_sc_hd__clkbuf_4 }
    - { template_name: R3_CONB_0, cell_type: sky130_fd_sc_hd__conb_1 }
"#;

/// `designs/tiny_mapped.json` of the fixture project: a NAND feeding a
/// flip-flop that feeds it back.
pub const DESIGN_JSON: &str = r#"{
  "modules": {
    "tiny": {
      "attributes": { "top": 1 },
      "ports": {
        "in1": { "direction": "input", "bits": [2] },
        "clk": { "direction": "input", "bits": [3] },
        "out1": { "direction": "output", "bits": [4] }
      },
      "cells": {
        "U0": {
          "type": "sky130_fd_sc_hd__nand2_2",
          "connections": { "A": [2], "B": [5], "Y": [4] }
        },
        "ff0": {
          "type": "sky130_fd_sc_hd__dfbbp_1",
          "connections": { "D": [4], "C": [3], "Q": [5] }
        }
      }
    }
  }
}"#;

/// Writes the fixture project under `root`.
pub fn write_project(root: &Path) {
    std::fs::create_dir_all(root.join("fabric")).unwrap();
    std::fs::create_dir_all(root.join("designs")).unwrap();
    std::fs::write(root.join("fabric/fabric_cells.yaml"), FABRIC_CELLS_YAML).unwrap();
    std::fs::write(root.join("fabric/pins.yaml"), PINS_YAML).unwrap();
    std::fs::write(root.join("fabric/fabric.yaml"), FABRIC_YAML).unwrap();
    std::fs::write(root.join("designs/tiny_mapped.json"), DESIGN_JSON).unwrap();
    // Fast annealing schedule so command tests stay quick.
    std::fs::write(
        root.join("weft.toml"),
        "[sa]\ninitial_temp = 10.0\nmoves_per_temp = 50\nmax_iterations = 2000\nseed = 7\n",
    )
    .unwrap();
}

/// Global args pointing the flow at the fixture project.
pub fn quiet_globals(root: &Path) -> crate::GlobalArgs {
    crate::GlobalArgs {
        quiet: true,
        verbose: false,
        config: Some(root.to_string_lossy().into_owned()),
    }
}
