//! Object-class vocabulary (COCO, 80 classes)

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! object_classes {
    ($($variant:ident => $label:literal),+ $(,)?) => {
        /// Object class reported by the detector
        ///
        /// Labels outside the fixed vocabulary are kept verbatim in `Other`.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum ObjectClass {
            $($variant,)+
            Other(String),
        }

        impl ObjectClass {
            /// Every label in the fixed vocabulary, in model output order
            pub const VOCABULARY: &'static [&'static str] = &[$($label),+];

            /// Map a model label onto the vocabulary
            pub fn from_label(label: &str) -> Self {
                match label {
                    $($label => ObjectClass::$variant,)+
                    other => ObjectClass::Other(other.to_string()),
                }
            }

            /// Label as reported by the model
            pub fn label(&self) -> &str {
                match self {
                    $(ObjectClass::$variant => $label,)+
                    ObjectClass::Other(label) => label,
                }
            }
        }
    };
}

object_classes! {
    Person => "person",
    Bicycle => "bicycle",
    Car => "car",
    Motorcycle => "motorcycle",
    Airplane => "airplane",
    Bus => "bus",
    Train => "train",
    Truck => "truck",
    Boat => "boat",
    TrafficLight => "traffic light",
    FireHydrant => "fire hydrant",
    StopSign => "stop sign",
    ParkingMeter => "parking meter",
    Bench => "bench",
    Bird => "bird",
    Cat => "cat",
    Dog => "dog",
    Horse => "horse",
    Sheep => "sheep",
    Cow => "cow",
    Elephant => "elephant",
    Bear => "bear",
    Zebra => "zebra",
    Giraffe => "giraffe",
    Backpack => "backpack",
    Umbrella => "umbrella",
    Handbag => "handbag",
    Tie => "tie",
    Suitcase => "suitcase",
    Frisbee => "frisbee",
    Skis => "skis",
    Snowboard => "snowboard",
    SportsBall => "sports ball",
    Kite => "kite",
    BaseballBat => "baseball bat",
    BaseballGlove => "baseball glove",
    Skateboard => "skateboard",
    Surfboard => "surfboard",
    TennisRacket => "tennis racket",
    Bottle => "bottle",
    WineGlass => "wine glass",
    Cup => "cup",
    Fork => "fork",
    Knife => "knife",
    Spoon => "spoon",
    Bowl => "bowl",
    Banana => "banana",
    Apple => "apple",
    Sandwich => "sandwich",
    Orange => "orange",
    Broccoli => "broccoli",
    Carrot => "carrot",
    HotDog => "hot dog",
    Pizza => "pizza",
    Donut => "donut",
    Cake => "cake",
    Chair => "chair",
    Couch => "couch",
    PottedPlant => "potted plant",
    Bed => "bed",
    DiningTable => "dining table",
    Toilet => "toilet",
    Tv => "tv",
    Laptop => "laptop",
    Mouse => "mouse",
    Remote => "remote",
    Keyboard => "keyboard",
    CellPhone => "cell phone",
    Microwave => "microwave",
    Oven => "oven",
    Toaster => "toaster",
    Sink => "sink",
    Refrigerator => "refrigerator",
    Book => "book",
    Clock => "clock",
    Vase => "vase",
    Scissors => "scissors",
    TeddyBear => "teddy bear",
    HairDrier => "hair drier",
    Toothbrush => "toothbrush",
}

impl ObjectClass {
    /// The privileged class that gets highlighted and clip alerts
    pub fn is_person(&self) -> bool {
        matches!(self, ObjectClass::Person)
    }

    /// Classes routed to the vehicle tone
    pub fn is_vehicle(&self) -> bool {
        matches!(
            self,
            ObjectClass::Car
                | ObjectClass::Truck
                | ObjectClass::Motorcycle
                | ObjectClass::Bicycle
                | ObjectClass::Bus
        )
    }

    /// Classes eligible for spoken notification
    pub fn is_alert_class(&self) -> bool {
        matches!(
            self,
            ObjectClass::Person
                | ObjectClass::Car
                | ObjectClass::Truck
                | ObjectClass::Motorcycle
                | ObjectClass::Bicycle
        )
    }

    /// Whether the label belongs to the fixed vocabulary
    pub fn is_known(&self) -> bool {
        !matches!(self, ObjectClass::Other(_))
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for ObjectClass {
    fn from(label: String) -> Self {
        match ObjectClass::from_label(&label) {
            ObjectClass::Other(_) => ObjectClass::Other(label),
            known => known,
        }
    }
}

impl From<&str> for ObjectClass {
    fn from(label: &str) -> Self {
        ObjectClass::from_label(label)
    }
}

impl From<ObjectClass> for String {
    fn from(class: ObjectClass) -> Self {
        match class {
            ObjectClass::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}
