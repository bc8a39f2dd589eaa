//! Shared fixtures: a small fitted surge model and its frozen encoders.
//!
//! The model is a 3-class stump ensemble over the 12-column surge contract:
//! class 0 fires on short trips, class 1 on cab type `C`, class 2 on high
//! customer ratings. Margins are +2/-2 so the intended class always wins.

#![allow(dead_code)]

use std::path::Path;

use serde_json::{json, Value};

/// Contract position of the split feature per class tree.
pub const TRIP_DISTANCE: u32 = 0;
pub const TYPE_OF_CAB: u32 = 1;
pub const CUSTOMER_RATING: u32 = 6;

fn stump(feature: u32, threshold: f32, left: f32, right: f32, gain: f64) -> Value {
    json!({
        "tree_param": {"num_nodes": "3", "num_feature": "12"},
        "loss_changes": [gain, 0.0, 0.0],
        "base_weights": [0.0, left, right],
        "left_children": [1, -1, -1],
        "right_children": [2, -1, -1],
        "split_indices": [feature, 0, 0],
        "split_conditions": [threshold, left, right],
        "split_type": [0, 0, 0],
        "default_left": [1, 0, 0],
    })
}

/// The fitted-classifier artifact, XGBoost >= 2.0 JSON.
pub fn surge_model_json() -> Value {
    json!({
        "version": [2, 0, 0],
        "learner": {
            "feature_names": [
                "Trip_Distance", "Type_of_Cab", "Customer_Since_Months",
                "Life_Style_Index", "Confidence_Life_Style_Index",
                "Destination_Type", "Customer_Rating",
                "Cancellation_Last_1Month", "Var1", "Var2", "Var3", "Gender",
            ],
            "feature_types": ["q", "c", "q", "q", "c", "c", "q", "q", "q", "q", "q", "c"],
            "objective": {
                "name": "multi:softprob",
                "softmax_multiclass_param": {"num_class": "3"},
            },
            "learner_model_param": {
                "base_score": "5E-1",
                "num_class": "3",
                "num_feature": "12",
            },
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "gbtree_model_param": {"num_trees": "3"},
                    "tree_info": [0, 1, 2],
                    "trees": [
                        stump(TRIP_DISTANCE, 10.0, 2.0, -2.0, 5.0),
                        stump(TYPE_OF_CAB, 1.5, -2.0, 2.0, 3.0),
                        stump(CUSTOMER_RATING, 4.0, -2.0, 2.0, 2.0),
                    ],
                },
            },
        },
    })
}

/// Frozen encoder artifacts, as `(column, classes)` pairs.
pub fn encoder_specs() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        ("Type_of_Cab", vec!["A", "B", "C"]),
        ("Confidence_Life_Style_Index", vec!["A", "B", "C"]),
        ("Destination_Type", vec!["A", "B", "C", "D"]),
        ("Gender", vec!["Female", "Male"]),
    ]
}

/// Write the model and encoder artifacts into `dir`, returning the model
/// path and the encoder directory.
pub fn write_artifacts(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let model_path = dir.join("surge_model.json");
    std::fs::write(&model_path, surge_model_json().to_string()).unwrap();

    let encoder_dir = dir.join("encoders");
    std::fs::create_dir_all(&encoder_dir).unwrap();
    for (column, classes) in encoder_specs() {
        let artifact = json!({"column": column, "classes": classes});
        std::fs::write(
            encoder_dir.join(format!("{column}.json")),
            artifact.to_string(),
        )
        .unwrap();
    }

    (model_path, encoder_dir)
}

/// A superset upload: identifier column, all 12 contracted columns, one
/// extra column. Rows are built to predict surge types 1, 2, 3 in order.
pub fn sample_csv() -> &'static str {
    "\
Trip_ID,Trip_Distance,Type_of_Cab,Customer_Since_Months,Life_Style_Index,Confidence_Life_Style_Index,Destination_Type,Customer_Rating,Cancellation_Last_1Month,Var1,Var2,Var3,Gender,Extra
T0001,5.0,A,10,2.5,B,A,1.0,0,40,46,60,Male,x
T0002,50.0,C,5,2.8,A,B,1.0,1,38,52,49,Female,y
T0003,50.0,A,2,3.1,C,D,5.0,2,45,49,70,Male,z
"
}
