use std::fmt;

/// A named version of the EVM specification. Each revision fixes the opcode
/// set and the cost schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Revision {
    Frontier = 0,
    Homestead = 1,
    TangerineWhistle = 2,
    SpuriousDragon = 3,
    Byzantium = 4,
    Constantinople = 5,
    Petersburg = 6,
    Istanbul = 7,
    Berlin = 8,
    London = 9,
    Paris = 10,
    Shanghai = 11,
    Cancun = 12,
}

impl Revision {
    pub const COUNT: usize = 13;
    pub const LATEST: Revision = Revision::Cancun;

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Revision {
        match index {
            0 => Revision::Frontier,
            1 => Revision::Homestead,
            2 => Revision::TangerineWhistle,
            3 => Revision::SpuriousDragon,
            4 => Revision::Byzantium,
            5 => Revision::Constantinople,
            6 => Revision::Petersburg,
            7 => Revision::Istanbul,
            8 => Revision::Berlin,
            9 => Revision::London,
            10 => Revision::Paris,
            11 => Revision::Shanghai,
            _ => Revision::Cancun,
        }
    }

    /// `const`-context replacement for `self >= other`.
    pub const fn at_least(self, other: Revision) -> bool {
        self as u8 >= other as u8
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Revision::Frontier => "Frontier",
            Revision::Homestead => "Homestead",
            Revision::TangerineWhistle => "Tangerine Whistle",
            Revision::SpuriousDragon => "Spurious Dragon",
            Revision::Byzantium => "Byzantium",
            Revision::Constantinople => "Constantinople",
            Revision::Petersburg => "Petersburg",
            Revision::Istanbul => "Istanbul",
            Revision::Berlin => "Berlin",
            Revision::London => "London",
            Revision::Paris => "Paris",
            Revision::Shanghai => "Shanghai",
            Revision::Cancun => "Cancun",
        };
        f.write_str(name)
    }
}
