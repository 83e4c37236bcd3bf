//! COBIDAS (Committee on Best Practices in Data Analysis and Sharing) checklist
//!
//! Rules for the MRI reporting items of COBIDAS Appendix D that can be
//! measured from BIDS sidecar metadata. D01 covers experimental design and
//! D02 acquisition; D02.06 is the arterial spin labelling family.

use crate::dataset::FileFilter;
use crate::engine::{Check, MetadataRule, Rule, Scope};

const NIFTI: &str = "nii.gz";

/// Labelling types that have a labelling duration
const CONTINUOUS_ASL: &[&str] = &["CASL", "PCASL"];
const PULSED_ASL: &[&str] = &["PASL"];

fn nifti() -> FileFilter {
    FileFilter::new().extension(NIFTI)
}

fn bold() -> FileFilter {
    FileFilter::new()
        .datatype("func")
        .suffix("bold")
        .extension(NIFTI)
}

fn dwi() -> FileFilter {
    FileFilter::new()
        .datatype("dwi")
        .suffix("dwi")
        .extension(NIFTI)
}

fn asl() -> FileFilter {
    FileFilter::new()
        .datatype("perf")
        .suffix("asl")
        .extension(NIFTI)
}

fn rule(id: &str, scope: Scope, checks: Vec<Check>) -> Box<dyn Rule> {
    Box::new(
        checks
            .into_iter()
            .fold(MetadataRule::new(id, scope), MetadataRule::check),
    )
}

/// Every registered COBIDAS rule
pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![
        // D01 Experimental design
        rule(
            "D01.04.01.00.00.01",
            Scope::PerTask(nifti()),
            vec![Check::present("TaskName")],
        ),
        rule(
            "D01.05.01.00.00.01",
            Scope::PerTask(nifti()),
            vec![Check::present("TaskDescription")],
        ),
        rule(
            "D01.05.02.00.00.01",
            Scope::PerTask(nifti()),
            vec![Check::present("Instructions")],
        ),
        rule(
            "D01.05.03.00.00.01",
            Scope::PerTask(nifti()),
            vec![Check::any_present(&["CogAtlasID", "CogPOID"])],
        ),
        rule(
            "D01.06.01.00.00.01",
            Scope::Files(bold()),
            vec![Check::sibling(Some("events"), "tsv")],
        ),
        // D02 Acquisition
        rule(
            "D02.02.01.00.00.01",
            Scope::Files(nifti()),
            vec![Check::all_present(&[
                "Manufacturer",
                "ManufacturersModelName",
                "MagneticFieldStrength",
            ])],
        ),
        rule(
            "D02.02.02.00.00.01",
            Scope::Files(nifti()),
            vec![Check::any_present(&["ReceiveCoilName", "ReceiveCoilActiveElements"])],
        ),
        rule(
            "D02.02.03.00.00.01",
            Scope::Files(nifti()),
            vec![Check::present("SoftwareVersions")],
        ),
        rule(
            "D02.03.01.00.00.01",
            Scope::Files(nifti()),
            vec![Check::any_present(&["PulseSequenceType", "ScanningSequence", "SequenceName"])],
        ),
        rule(
            "D02.03.02.00.00.01",
            Scope::Files(bold()),
            vec![Check::each_present(&["RepetitionTime", "EchoTime", "FlipAngle"])],
        ),
        rule(
            "D02.03.03.00.00.01",
            Scope::Files(nifti()),
            vec![Check::present("ParallelReductionFactorInPlane")],
        ),
        rule(
            "D02.03.04.00.00.01",
            Scope::Files(bold()),
            vec![Check::present("MultibandAccelerationFactor")],
        ),
        rule(
            "D02.03.05.00.00.01",
            Scope::Files(bold()),
            vec![Check::present("SliceTiming")],
        ),
        rule(
            "D02.03.06.00.00.01",
            Scope::Files(bold()),
            vec![
                Check::present("PhaseEncodingDirection"),
                Check::any_present(&["EffectiveEchoSpacing", "TotalReadoutTime"]),
            ],
        ),
        rule(
            "D02.04.01.00.00.01",
            Scope::Files(dwi()),
            vec![
                Check::sibling(None, "bval"),
                Check::sibling(None, "bvec"),
            ],
        ),
        rule(
            "D02.05.01.00.00.01",
            Scope::Files(FileFilter::new().datatype("fmap").extension(NIFTI)),
            vec![Check::any_present(&["IntendedFor", "B0FieldIdentifier"])],
        ),
        rule(
            "D02.07.01.00.00.01",
            Scope::Files(FileFilter::new().datatype("anat").suffix("T1w").extension(NIFTI)),
            vec![Check::each_present(&["RepetitionTime", "EchoTime", "FlipAngle", "InversionTime"])],
        ),
        // D02.06 Arterial spin labelling
        rule(
            "D02.06.01.00.00.01",
            Scope::Files(asl()),
            vec![Check::each_present(&[
                "ArterialSpinLabelingType",
                "PostLabelingDelay",
                "BackgroundSuppression",
                "M0Type",
            ])],
        ),
        rule(
            "D02.06.02.00.00.01",
            Scope::Files(asl()),
            vec![
                Check::when(
                    "ArterialSpinLabelingType",
                    CONTINUOUS_ASL,
                    vec![Check::each_present(&["LabelingDuration", "LabelingEfficiency"])],
                ),
                Check::when(
                    "ArterialSpinLabelingType",
                    &["PCASL"],
                    vec![Check::present("PCASLType")],
                ),
            ],
        ),
        rule(
            "D02.06.03.00.00.01",
            Scope::Files(asl()),
            vec![Check::when(
                "ArterialSpinLabelingType",
                PULSED_ASL,
                vec![Check::each_present(&["BolusCutOffFlag", "PASLType"])],
            )],
        ),
        rule(
            "D02.06.04.00.00.01",
            Scope::Files(asl()),
            vec![Check::sibling(Some("aslcontext"), "tsv")],
        ),
        rule(
            "D02.06.05.00.00.01",
            Scope::Files(asl()),
            vec![Check::present("VascularCrushing")],
        ),
        rule(
            "D02.06.06.00.00.01",
            Scope::Files(asl()),
            vec![Check::when(
                "M0Type",
                &["Separate"],
                vec![Check::sibling(Some("m0scan"), NIFTI)],
            )],
        ),
    ]
}

/// Identifiers of the arterial spin labelling rules
pub fn asl_rule_ids() -> Vec<&'static str> {
    vec![
        "D02.06.01.00.00.01",
        "D02.06.02.00.00.01",
        "D02.06.03.00.00.01",
        "D02.06.04.00.00.01",
        "D02.06.05.00.00.01",
        "D02.06.06.00.00.01",
    ]
}
