// ABOUTME: Report dataset definitions - field maps and transform hooks per dataset
// ABOUTME: Requests, CSR activities and CSR flex notes share one pipeline

use crate::pipeline::{FieldMap, ReportDataset, Step};
use crate::socrata::LoadMethod;

pub const REQUESTS_MAP: FieldMap = &[
    ("Service Request (SR) Number", "sr_number"),
    ("SR Type Code", "sr_type_code"),
    ("SR Description", "sr_type_desc"),
    ("Owning Department", "sr_department_desc"),
    ("Method Received", "sr_method_received_desc"),
    ("SR Status", "sr_status_desc"),
    ("Status Change Date", "sr_status_date"),
    ("Created Date", "sr_created_date"),
    ("Last Update Date", "sr_updated_date"),
    ("Close Date", "sr_closed_date"),
    ("Overdue On Date", "sr_overdue_date"),
    ("SR Location", "sr_location"),
    ("Street Number", "sr_location_street_number"),
    ("Street Name", "sr_location_street_name"),
    ("City", "sr_location_city"),
    ("Zip Code", "sr_location_zip_code"),
    ("County", "sr_location_county"),
    ("Council District", "sr_location_council_district"),
    ("State Plane X Coordinate", "state_plane_x_coordinate"),
    ("State Plane Y Coordinate", "state_plane_y_coordinate"),
    ("latitude", "sr_location_lat"),
    ("longitude", "sr_location_long"),
    ("location", "sr_location_lat_long"),
    ("fiscal_year", "sr_fiscal_year"),
];

pub const ACTIVITIES_MAP: FieldMap = &[
    ("Service Request (SR) Number", "sr_number"),
    ("Activity Id", "activity_id"),
    ("Activity Code", "activity_code"),
    ("Activity Description", "activity_desc"),
    ("Activity Status", "activity_status"),
    ("Activity Outcome", "activity_outcome"),
    ("Activity Created Date", "activity_created_date"),
    ("Activity Last Update Date", "activity_updated_date"),
    ("Activity Completed Date", "activity_completed_date"),
];

pub const FLEX_NOTES_MAP: FieldMap = &[
    ("Service Request (SR) Number", "sr_number"),
    ("SR Type Code", "sr_type_code"),
    ("Flex Question", "flex_question"),
    ("Flex Answer", "flex_answer"),
];

/// Flex questions whose answers hold personal or payment details.
pub const IGNORED_QUESTIONS: &[&str] = &[
    "Mobile Apps Reporter Information",
    "Provide license plate number of vehicle, if known.",
    "*What are the last 4 digits of the card number that you used for this transaction?",
    "Enter APD  # if known (Case #, Officer #, etc.).",
    "Provide User ID from ParkATX App (If user ID is unavailable, type N/A)",
    "What are the last 4 digits of the card number that you used for this transaction?",
    "What is the 9-digit citation number (top line)?",
];

pub const REQUESTS: ReportDataset = ReportDataset {
    name: "311 requests",
    dataset_var: "REQUESTS_DATASET",
    endpoint_var: "REQUESTS_ENDPOINT",
    pre: &[
        Step::ProjectStatePlane {
            x: "State Plane X Coordinate",
            y: "State Plane Y Coordinate",
        },
        Step::FiscalYear {
            from: "Created Date",
        },
    ],
    field_map: REQUESTS_MAP,
    post: &[Step::FormatDates],
    method: LoadMethod::Upsert,
};

pub const ACTIVITIES: ReportDataset = ReportDataset {
    name: "CSR activities",
    dataset_var: "ACTIVITIES_DATASET",
    endpoint_var: "ACTIVITIES_ENDPOINT",
    pre: &[],
    field_map: ACTIVITIES_MAP,
    // CSRs without activities come through as a row with no activity id.
    post: &[
        Step::FormatDates,
        Step::DropMissing {
            field: "activity_id",
        },
    ],
    method: LoadMethod::Upsert,
};

pub const FLEX_NOTES: ReportDataset = ReportDataset {
    name: "CSR flex notes",
    dataset_var: "FLEX_NOTES_DATASET",
    endpoint_var: "FLEX_NOTE_ENDPOINT",
    pre: &[],
    field_map: FLEX_NOTES_MAP,
    post: &[Step::ExcludeValues {
        field: "flex_question",
        values: IGNORED_QUESTIONS,
    }],
    method: LoadMethod::Upsert,
};
