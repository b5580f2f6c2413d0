//! National variants of the CP037 layout
//!
//! Each table lists only the positions where the page departs from CP037.
//! Positions a page leaves undefined map to [`REPLACEMENT_CHAR`].

use super::REPLACEMENT_CHAR;

/// CCSID 273, Germany and Austria
pub(crate) const CP273_OVERRIDES: [(u8, char); 21] = [
    (0x43, '{'), (0x4A, '\u{00C4}'), (0x4F, '!'), (0x59, '~'),
    (0x5A, '\u{00DC}'), (0x5F, '^'), (0x63, '['), (0x6A, '\u{00F6}'),
    (0x7C, '\u{00A7}'), (0xA1, '\u{00DF}'), (0xB0, '\u{00A2}'), (0xB5, '@'),
    (0xBA, '\u{00AC}'), (0xBB, '|'), (0xC0, '\u{00E4}'), (0xCC, '\u{00A6}'),
    (0xD0, '\u{00FC}'), (0xDC, '}'), (0xE0, '\u{00D6}'), (0xEC, '\\'),
    (0xFC, ']'),
];

/// CCSID 277, Denmark and Norway
pub(crate) const CP277_OVERRIDES: [(u8, char); 22] = [
    (0x47, '}'), (0x4A, '#'), (0x4F, '!'), (0x5A, '\u{00A4}'),
    (0x5B, '\u{00C5}'), (0x5F, '^'), (0x67, '$'), (0x6A, '\u{00F8}'),
    (0x70, '\u{00A6}'), (0x7B, '\u{00C6}'), (0x7C, '\u{00D8}'), (0x80, '@'),
    (0x9C, '{'), (0x9E, '['), (0x9F, ']'), (0xA1, '\u{00FC}'),
    (0xB0, '\u{00A2}'), (0xBA, '\u{00AC}'), (0xBB, '|'), (0xC0, '\u{00E6}'),
    (0xD0, '\u{00E5}'), (0xDC, '~'),
];

/// CCSID 278, Finland and Sweden
pub(crate) const CP278_OVERRIDES: [(u8, char); 25] = [
    (0x43, '{'), (0x47, '}'), (0x4A, '\u{00A7}'), (0x4F, '!'),
    (0x51, '`'), (0x5A, '\u{00A4}'), (0x5B, '\u{00C5}'), (0x5F, '^'),
    (0x63, '#'), (0x67, '$'), (0x6A, '\u{00F6}'), (0x79, '\u{00E9}'),
    (0x7B, '\u{00C4}'), (0x7C, '\u{00D6}'), (0x9F, ']'), (0xA1, '\u{00FC}'),
    (0xB0, '\u{00A2}'), (0xB5, '['), (0xBA, '\u{00AC}'), (0xBB, '|'),
    (0xC0, '\u{00E4}'), (0xCC, '\u{00A6}'), (0xD0, '\u{00E5}'), (0xDC, '~'),
    (0xEC, '@'),
];

/// CCSID 280, Italy
pub(crate) const CP280_OVERRIDES: [(u8, char); 25] = [
    (0x44, '{'), (0x48, '\\'), (0x4A, '\u{00B0}'), (0x4F, '!'),
    (0x51, ']'), (0x54, '}'), (0x58, '~'), (0x5A, '\u{00E9}'),
    (0x5F, '^'), (0x6A, '\u{00F2}'), (0x79, '\u{00F9}'), (0x7B, '\u{00A3}'),
    (0x7C, '\u{00A7}'), (0x90, '['), (0xA1, '\u{00EC}'), (0xB0, '\u{00A2}'),
    (0xB1, '#'), (0xB5, '@'), (0xBA, '\u{00AC}'), (0xBB, '|'),
    (0xC0, '\u{00E0}'), (0xCD, '\u{00A6}'), (0xD0, '\u{00E8}'), (0xDD, '`'),
    (0xE0, '\u{00E7}'),
];

/// CCSID 284, Spain and Latin America
pub(crate) const CP284_OVERRIDES: [(u8, char); 11] = [
    (0x49, '\u{00A6}'), (0x4A, '['), (0x5A, ']'), (0x69, '#'),
    (0x6A, '\u{00F1}'), (0x7B, '\u{00D1}'), (0xA1, '\u{00A8}'), (0xB0, '\u{00A2}'),
    (0xBA, '^'), (0xBB, '!'), (0xBD, '~'),
];

/// CCSID 285, United Kingdom
pub(crate) const CP285_OVERRIDES: [(u8, char); 7] = [
    (0x4A, '$'), (0x5B, '\u{00A3}'), (0xA1, '\u{203E}'), (0xB0, '\u{00A2}'),
    (0xB1, '['), (0xBA, '^'), (0xBC, '~'),
];

/// CCSID 297, France
pub(crate) const CP297_OVERRIDES: [(u8, char); 25] = [
    (0x44, '@'), (0x48, '\\'), (0x4A, '\u{00B0}'), (0x4F, '!'),
    (0x51, '{'), (0x54, '}'), (0x5A, '\u{00A7}'), (0x5F, '^'),
    (0x6A, '\u{00F9}'), (0x79, '\u{00B5}'), (0x7B, '\u{00A3}'), (0x7C, '\u{00E0}'),
    (0x90, '['), (0xA0, '`'), (0xA1, '\u{00A8}'), (0xB0, '\u{00A2}'),
    (0xB1, '#'), (0xB5, ']'), (0xBA, '\u{00AC}'), (0xBB, '|'),
    (0xBD, '~'), (0xC0, '\u{00E9}'), (0xD0, '\u{00E8}'), (0xDD, '\u{00A6}'),
    (0xE0, '\u{00E7}'),
];

/// CCSID 424, Hebrew
pub(crate) const CP424_OVERRIDES: [(u8, char); 68] = [
    (0x41, '\u{05D0}'), (0x42, '\u{05D1}'), (0x43, '\u{05D2}'), (0x44, '\u{05D3}'),
    (0x45, '\u{05D4}'), (0x46, '\u{05D5}'), (0x47, '\u{05D6}'), (0x48, '\u{05D7}'),
    (0x49, '\u{05D8}'), (0x51, '\u{05D9}'), (0x52, '\u{05DA}'), (0x53, '\u{05DB}'),
    (0x54, '\u{05DC}'), (0x55, '\u{05DD}'), (0x56, '\u{05DE}'), (0x57, '\u{05DF}'),
    (0x58, '\u{05E0}'), (0x59, '\u{05E1}'), (0x62, '\u{05E2}'), (0x63, '\u{05E3}'),
    (0x64, '\u{05E4}'), (0x65, '\u{05E5}'), (0x66, '\u{05E6}'), (0x67, '\u{05E7}'),
    (0x68, '\u{05E8}'), (0x69, '\u{05E9}'), (0x70, REPLACEMENT_CHAR), (0x71, '\u{05EA}'),
    (0x72, REPLACEMENT_CHAR), (0x73, REPLACEMENT_CHAR), (0x74, '\u{00A0}'), (0x75, REPLACEMENT_CHAR),
    (0x76, REPLACEMENT_CHAR), (0x77, REPLACEMENT_CHAR), (0x78, '\u{21D4}'), (0x80, REPLACEMENT_CHAR),
    (0x8C, REPLACEMENT_CHAR), (0x8D, REPLACEMENT_CHAR), (0x8E, REPLACEMENT_CHAR), (0x8F, REPLACEMENT_CHAR),
    (0x9A, REPLACEMENT_CHAR), (0x9B, REPLACEMENT_CHAR), (0x9C, REPLACEMENT_CHAR), (0x9E, REPLACEMENT_CHAR),
    (0xAA, REPLACEMENT_CHAR), (0xAB, REPLACEMENT_CHAR), (0xAC, REPLACEMENT_CHAR), (0xAD, REPLACEMENT_CHAR),
    (0xAE, REPLACEMENT_CHAR), (0xCB, REPLACEMENT_CHAR), (0xCC, REPLACEMENT_CHAR), (0xCD, REPLACEMENT_CHAR),
    (0xCE, REPLACEMENT_CHAR), (0xCF, REPLACEMENT_CHAR), (0xDB, REPLACEMENT_CHAR), (0xDC, REPLACEMENT_CHAR),
    (0xDD, REPLACEMENT_CHAR), (0xDE, REPLACEMENT_CHAR), (0xDF, REPLACEMENT_CHAR), (0xEB, REPLACEMENT_CHAR),
    (0xEC, REPLACEMENT_CHAR), (0xED, REPLACEMENT_CHAR), (0xEE, REPLACEMENT_CHAR), (0xEF, REPLACEMENT_CHAR),
    (0xFB, REPLACEMENT_CHAR), (0xFC, REPLACEMENT_CHAR), (0xFD, REPLACEMENT_CHAR), (0xFE, REPLACEMENT_CHAR),
];

/// CCSID 870, Latin-2 multilingual
pub(crate) const CP870_OVERRIDES: [(u8, char); 62] = [
    (0x44, '\u{0163}'), (0x46, '\u{0103}'), (0x47, '\u{010D}'), (0x49, '\u{0107}'),
    (0x4A, '['), (0x4F, '!'), (0x52, '\u{0119}'), (0x54, '\u{016F}'),
    (0x57, '\u{013E}'), (0x58, '\u{013A}'), (0x5A, ']'), (0x5F, '^'),
    (0x64, '\u{02DD}'), (0x66, '\u{0102}'), (0x67, '\u{010C}'), (0x69, '\u{0106}'),
    (0x6A, '|'), (0x70, '\u{02C7}'), (0x72, '\u{0118}'), (0x74, '\u{016E}'),
    (0x77, '\u{013D}'), (0x78, '\u{0139}'), (0x80, '\u{02D8}'), (0x8A, '\u{015B}'),
    (0x8B, '\u{0148}'), (0x8C, '\u{0111}'), (0x8E, '\u{0159}'), (0x8F, '\u{015F}'),
    (0x9A, '\u{0142}'), (0x9B, '\u{0144}'), (0x9C, '\u{0161}'), (0x9E, '\u{02DB}'),
    (0xA0, '\u{0105}'), (0xAA, '\u{015A}'), (0xAB, '\u{0147}'), (0xAC, '\u{0110}'),
    (0xAE, '\u{0158}'), (0xAF, '\u{015E}'), (0xB0, '\u{00B7}'), (0xB1, '\u{0104}'),
    (0xB2, '\u{017C}'), (0xB3, '\u{0162}'), (0xB4, '\u{017B}'), (0xB6, '\u{017E}'),
    (0xB7, '\u{017A}'), (0xB8, '\u{017D}'), (0xB9, '\u{0179}'), (0xBA, '\u{0141}'),
    (0xBB, '\u{0143}'), (0xBC, '\u{0160}'), (0xCD, '\u{0155}'), (0xCF, '\u{0151}'),
    (0xDA, '\u{011A}'), (0xDB, '\u{0171}'), (0xDD, '\u{0165}'), (0xDF, '\u{011B}'),
    (0xEA, '\u{010F}'), (0xED, '\u{0154}'), (0xEF, '\u{0150}'), (0xFA, '\u{010E}'),
    (0xFB, '\u{0170}'), (0xFD, '\u{0164}'),
];

/// CCSID 871, Iceland
pub(crate) const CP871_OVERRIDES: [(u8, char); 22] = [
    (0x4A, '\u{00FE}'), (0x4F, '!'), (0x5A, '\u{00C6}'), (0x5F, '\u{00D6}'),
    (0x79, '\u{00F0}'), (0x7C, '\u{00D0}'), (0x8C, '`'), (0x8E, '{'),
    (0x9C, '}'), (0x9E, ']'), (0xA1, '\u{00F6}'), (0xAC, '@'),
    (0xAE, '['), (0xB0, '\u{00A2}'), (0xBA, '\u{00AC}'), (0xBB, '|'),
    (0xBE, '\\'), (0xC0, '\u{00DE}'), (0xCC, '~'), (0xD0, '\u{00E6}'),
    (0xE0, '\u{00B4}'), (0xEC, '^'),
];

/// CCSID 875, Greek
pub(crate) const CP875_OVERRIDES: [(u8, char); 97] = [
    (0x41, '\u{0391}'), (0x42, '\u{0392}'), (0x43, '\u{0393}'), (0x44, '\u{0394}'),
    (0x45, '\u{0395}'), (0x46, '\u{0396}'), (0x47, '\u{0397}'), (0x48, '\u{0398}'),
    (0x49, '\u{0399}'), (0x4A, '['), (0x4F, '!'), (0x51, '\u{039A}'),
    (0x52, '\u{039B}'), (0x53, '\u{039C}'), (0x54, '\u{039D}'), (0x55, '\u{039E}'),
    (0x56, '\u{039F}'), (0x57, '\u{03A0}'), (0x58, '\u{03A1}'), (0x59, '\u{03A3}'),
    (0x5A, ']'), (0x5F, '^'), (0x62, '\u{03A4}'), (0x63, '\u{03A5}'),
    (0x64, '\u{03A6}'), (0x65, '\u{03A7}'), (0x66, '\u{03A8}'), (0x67, '\u{03A9}'),
    (0x68, '\u{03AA}'), (0x69, '\u{03AB}'), (0x6A, REPLACEMENT_CHAR), (0x70, '\u{00A8}'),
    (0x71, '\u{0386}'), (0x72, '\u{0388}'), (0x73, '\u{0389}'), (0x74, '\u{2207}'),
    (0x75, '\u{038A}'), (0x76, '\u{038C}'), (0x77, '\u{038E}'), (0x78, '\u{038F}'),
    (0x80, '\u{0385}'), (0x8A, '\u{03B1}'), (0x8B, '\u{03B2}'), (0x8C, '\u{03B3}'),
    (0x8D, '\u{03B4}'), (0x8E, '\u{03B5}'), (0x8F, '\u{03B6}'), (0x9A, '\u{03B7}'),
    (0x9B, '\u{03B8}'), (0x9C, '\u{03B9}'), (0x9D, '\u{03BA}'), (0x9E, '\u{03BB}'),
    (0x9F, '\u{03BC}'), (0xA0, '\u{00B4}'), (0xAA, '\u{03BD}'), (0xAB, '\u{03BE}'),
    (0xAC, '\u{03BF}'), (0xAD, '\u{03C0}'), (0xAE, '\u{03C1}'), (0xAF, '\u{03C3}'),
    (0xB0, '\u{00A3}'), (0xB1, '\u{03AC}'), (0xB2, '\u{03AD}'), (0xB3, '\u{03AE}'),
    (0xB4, '\u{03CA}'), (0xB5, '\u{03AF}'), (0xB6, '\u{03CC}'), (0xB7, '\u{03CD}'),
    (0xB8, '\u{03CB}'), (0xB9, '\u{03CE}'), (0xBA, '\u{03C2}'), (0xBB, '\u{03C4}'),
    (0xBC, '\u{03C5}'), (0xBD, '\u{03C6}'), (0xBE, '\u{03C7}'), (0xBF, '\u{03C8}'),
    (0xCB, '\u{03C9}'), (0xCC, '\u{0390}'), (0xCD, '\u{03B0}'), (0xCE, '\u{2018}'),
    (0xCF, '\u{2015}'), (0xDA, '\u{00B1}'), (0xDB, '\u{00BD}'), (0xDC, REPLACEMENT_CHAR),
    (0xDD, '\u{00B7}'), (0xDE, '\u{2019}'), (0xDF, '\u{00A6}'), (0xE1, REPLACEMENT_CHAR),
    (0xEB, '\u{00A7}'), (0xEC, REPLACEMENT_CHAR), (0xED, REPLACEMENT_CHAR), (0xEE, '\u{00AB}'),
    (0xEF, '\u{00AC}'), (0xFB, '\u{00A9}'), (0xFC, REPLACEMENT_CHAR), (0xFD, REPLACEMENT_CHAR),
    (0xFE, '\u{00BB}'),
];

/// CCSID 1025, Cyrillic multilingual
pub(crate) const CP1025_OVERRIDES: [(u8, char); 100] = [
    (0x42, '\u{0452}'), (0x43, '\u{0453}'), (0x44, '\u{0451}'), (0x45, '\u{0454}'),
    (0x46, '\u{0455}'), (0x47, '\u{0456}'), (0x48, '\u{0457}'), (0x49, '\u{0458}'),
    (0x4A, '['), (0x4F, '!'), (0x51, '\u{0459}'), (0x52, '\u{045A}'),
    (0x53, '\u{045B}'), (0x54, '\u{045C}'), (0x55, '\u{045E}'), (0x56, '\u{045F}'),
    (0x57, '\u{042A}'), (0x58, '\u{2116}'), (0x59, '\u{0402}'), (0x5A, ']'),
    (0x5F, '^'), (0x62, '\u{0403}'), (0x63, '\u{0401}'), (0x64, '\u{0404}'),
    (0x65, '\u{0405}'), (0x66, '\u{0406}'), (0x67, '\u{0407}'), (0x68, '\u{0408}'),
    (0x69, '\u{0409}'), (0x6A, '|'), (0x70, '\u{040A}'), (0x71, '\u{040B}'),
    (0x72, '\u{040C}'), (0x73, '\u{00AD}'), (0x74, '\u{040E}'), (0x75, '\u{040F}'),
    (0x76, '\u{044E}'), (0x77, '\u{0430}'), (0x78, '\u{0431}'), (0x80, '\u{0446}'),
    (0x8A, '\u{0434}'), (0x8B, '\u{0435}'), (0x8C, '\u{0444}'), (0x8D, '\u{0433}'),
    (0x8E, '\u{0445}'), (0x8F, '\u{0438}'), (0x90, '\u{0439}'), (0x9A, '\u{043A}'),
    (0x9B, '\u{043B}'), (0x9C, '\u{043C}'), (0x9D, '\u{043D}'), (0x9E, '\u{043E}'),
    (0x9F, '\u{043F}'), (0xA0, '\u{044F}'), (0xAA, '\u{0440}'), (0xAB, '\u{0441}'),
    (0xAC, '\u{0442}'), (0xAD, '\u{0443}'), (0xAE, '\u{0436}'), (0xAF, '\u{0432}'),
    (0xB0, '\u{044C}'), (0xB1, '\u{044B}'), (0xB2, '\u{0437}'), (0xB3, '\u{0448}'),
    (0xB4, '\u{044D}'), (0xB5, '\u{0449}'), (0xB6, '\u{0447}'), (0xB7, '\u{044A}'),
    (0xB8, '\u{042E}'), (0xB9, '\u{0410}'), (0xBA, '\u{0411}'), (0xBB, '\u{0426}'),
    (0xBC, '\u{0414}'), (0xBD, '\u{0415}'), (0xBE, '\u{0424}'), (0xBF, '\u{0413}'),
    (0xCA, '\u{0425}'), (0xCB, '\u{0418}'), (0xCC, '\u{0419}'), (0xCD, '\u{041A}'),
    (0xCE, '\u{041B}'), (0xCF, '\u{041C}'), (0xDA, '\u{041D}'), (0xDB, '\u{041E}'),
    (0xDC, '\u{041F}'), (0xDD, '\u{042F}'), (0xDE, '\u{0420}'), (0xDF, '\u{0421}'),
    (0xE1, '\u{00A7}'), (0xEA, '\u{0422}'), (0xEB, '\u{0423}'), (0xEC, '\u{0416}'),
    (0xED, '\u{0412}'), (0xEE, '\u{042C}'), (0xEF, '\u{042B}'), (0xFA, '\u{0417}'),
    (0xFB, '\u{0428}'), (0xFC, '\u{042D}'), (0xFD, '\u{0429}'), (0xFE, '\u{0427}'),
];

/// CCSID 1026, Turkish
pub(crate) const CP1026_OVERRIDES: [(u8, char); 31] = [
    (0x48, '{'), (0x4A, '\u{00C7}'), (0x4F, '!'), (0x5A, '\u{011E}'),
    (0x5B, '\u{0130}'), (0x5F, '^'), (0x68, '['), (0x6A, '\u{015F}'),
    (0x79, '\u{0131}'), (0x7B, '\u{00D6}'), (0x7C, '\u{015E}'), (0x7F, '\u{00DC}'),
    (0x8C, '}'), (0x8D, '`'), (0x8E, '\u{00A6}'), (0x9D, '\u{02DB}'),
    (0xA1, '\u{00F6}'), (0xAC, ']'), (0xAD, '$'), (0xAE, '@'),
    (0xB0, '\u{00A2}'), (0xBA, '\u{00AC}'), (0xBB, '|'), (0xBC, '\u{2014}'),
    (0xC0, '\u{00E7}'), (0xCC, '~'), (0xD0, '\u{011F}'), (0xDC, '\\'),
    (0xE0, '\u{00FC}'), (0xEC, '#'), (0xFC, '"'),
];

/// CCSID 1112, Baltic
pub(crate) const CP1112_OVERRIDES: [(u8, char); 52] = [
    (0x42, '\u{0161}'), (0x44, '\u{0105}'), (0x45, '\u{012F}'), (0x46, '\u{016B}'),
    (0x48, '\u{0113}'), (0x49, '\u{017E}'), (0x52, '\u{0119}'), (0x53, '\u{0117}'),
    (0x54, '\u{010D}'), (0x55, '\u{0173}'), (0x56, '\u{201E}'), (0x57, '\u{201C}'),
    (0x58, '\u{0123}'), (0x62, '\u{0160}'), (0x64, '\u{0104}'), (0x65, '\u{012E}'),
    (0x66, '\u{016A}'), (0x68, '\u{0112}'), (0x69, '\u{017D}'), (0x72, '\u{0118}'),
    (0x73, '\u{0116}'), (0x74, '\u{010C}'), (0x75, '\u{0172}'), (0x76, '\u{012A}'),
    (0x77, '\u{013B}'), (0x78, '\u{0122}'), (0x8C, '\u{0101}'), (0x8D, '\u{017C}'),
    (0x8E, '\u{0144}'), (0x9A, '\u{0156}'), (0x9B, '\u{0157}'), (0x9D, '\u{0137}'),
    (0xAA, '\u{201D}'), (0xAB, '\u{017A}'), (0xAC, '\u{0100}'), (0xAD, '\u{017B}'),
    (0xAE, '\u{0143}'), (0xB2, '\u{012B}'), (0xBC, '\u{0179}'), (0xBD, '\u{0136}'),
    (0xBE, '\u{013C}'), (0xCB, '\u{014D}'), (0xCD, '\u{0146}'), (0xDB, '\u{0107}'),
    (0xDD, '\u{0142}'), (0xDE, '\u{015B}'), (0xDF, '\u{2019}'), (0xEB, '\u{014C}'),
    (0xED, '\u{0145}'), (0xFB, '\u{0106}'), (0xFD, '\u{0141}'), (0xFE, '\u{015A}'),
];

/// CCSID 1122, Estonian
pub(crate) const CP1122_OVERRIDES: [(u8, char); 31] = [
    (0x43, '{'), (0x47, '}'), (0x4A, '\u{00A7}'), (0x4F, '!'),
    (0x51, '`'), (0x5A, '\u{00A4}'), (0x5B, '\u{00C5}'), (0x5F, '^'),
    (0x63, '#'), (0x67, '$'), (0x6A, '\u{00F6}'), (0x71, '\\'),
    (0x79, '\u{00E9}'), (0x7B, '\u{00C4}'), (0x7C, '\u{00D6}'), (0x8C, '\u{0161}'),
    (0x8E, '\u{017E}'), (0x9F, ']'), (0xA1, '\u{00FC}'), (0xAC, '\u{0160}'),
    (0xAE, '\u{017D}'), (0xB0, '\u{00A2}'), (0xB5, '['), (0xBA, '\u{00AC}'),
    (0xBB, '|'), (0xC0, '\u{00E4}'), (0xCC, '\u{00A6}'), (0xD0, '\u{00E5}'),
    (0xDC, '~'), (0xE0, '\u{00C9}'), (0xEC, '@'),
];

/// CCSID 1141, Germany and Austria with euro
pub(crate) const CP1141_OVERRIDES: [(u8, char); 22] = [
    (0x43, '{'), (0x4A, '\u{00C4}'), (0x4F, '!'), (0x59, '~'),
    (0x5A, '\u{00DC}'), (0x5F, '^'), (0x63, '['), (0x6A, '\u{00F6}'),
    (0x7C, '\u{00A7}'), (0x9F, '\u{20AC}'), (0xA1, '\u{00DF}'), (0xB0, '\u{00A2}'),
    (0xB5, '@'), (0xBA, '\u{00AC}'), (0xBB, '|'), (0xC0, '\u{00E4}'),
    (0xCC, '\u{00A6}'), (0xD0, '\u{00FC}'), (0xDC, '}'), (0xE0, '\u{00D6}'),
    (0xEC, '\\'), (0xFC, ']'),
];

/// CCSID 1147, France with euro
pub(crate) const CP1147_OVERRIDES: [(u8, char); 26] = [
    (0x44, '@'), (0x48, '\\'), (0x4A, '\u{00B0}'), (0x4F, '!'),
    (0x51, '{'), (0x54, '}'), (0x5A, '\u{00A7}'), (0x5F, '^'),
    (0x6A, '\u{00F9}'), (0x79, '\u{00B5}'), (0x7B, '\u{00A3}'), (0x7C, '\u{00E0}'),
    (0x90, '['), (0x9F, '\u{20AC}'), (0xA0, '`'), (0xA1, '\u{00A8}'),
    (0xB0, '\u{00A2}'), (0xB1, '#'), (0xB5, ']'), (0xBA, '\u{00AC}'),
    (0xBB, '|'), (0xBD, '~'), (0xC0, '\u{00E9}'), (0xD0, '\u{00E8}'),
    (0xDD, '\u{00A6}'), (0xE0, '\u{00E7}'),
];

/// Single-byte half of CCSID 930, katakana (CCSID 290)
pub(crate) const CP290_OVERRIDES: [(u8, char); 126] = [
    (0x41, '\u{FF61}'), (0x42, '\u{FF62}'), (0x43, '\u{FF63}'), (0x44, '\u{FF64}'),
    (0x45, '\u{FF65}'), (0x46, '\u{FF66}'), (0x47, '\u{FF67}'), (0x48, '\u{FF68}'),
    (0x49, '\u{FF69}'), (0x4A, '\u{00A3}'), (0x51, '\u{FF6A}'), (0x52, '\u{FF6B}'),
    (0x53, '\u{FF6C}'), (0x54, '\u{FF6D}'), (0x55, '\u{FF6E}'), (0x56, '\u{FF6F}'),
    (0x57, REPLACEMENT_CHAR), (0x58, '\u{FF70}'), (0x59, REPLACEMENT_CHAR), (0x5B, '\u{00A5}'),
    (0x62, 'a'), (0x63, 'b'), (0x64, 'c'), (0x65, 'd'),
    (0x66, 'e'), (0x67, 'f'), (0x68, 'g'), (0x69, 'h'),
    (0x6A, REPLACEMENT_CHAR), (0x70, '['), (0x71, 'i'), (0x72, 'j'),
    (0x73, 'k'), (0x74, 'l'), (0x75, 'm'), (0x76, 'n'),
    (0x77, 'o'), (0x78, 'p'), (0x80, ']'), (0x81, '\u{FF71}'),
    (0x82, '\u{FF72}'), (0x83, '\u{FF73}'), (0x84, '\u{FF74}'), (0x85, '\u{FF75}'),
    (0x86, '\u{FF76}'), (0x87, '\u{FF77}'), (0x88, '\u{FF78}'), (0x89, '\u{FF79}'),
    (0x8A, '\u{FF7A}'), (0x8B, 'q'), (0x8C, '\u{FF7B}'), (0x8D, '\u{FF7C}'),
    (0x8E, '\u{FF7D}'), (0x8F, '\u{FF7E}'), (0x90, '\u{FF7F}'), (0x91, '\u{FF80}'),
    (0x92, '\u{FF81}'), (0x93, '\u{FF82}'), (0x94, '\u{FF83}'), (0x95, '\u{FF84}'),
    (0x96, '\u{FF85}'), (0x97, '\u{FF86}'), (0x98, '\u{FF87}'), (0x99, '\u{FF88}'),
    (0x9A, '\u{FF89}'), (0x9B, 'r'), (0x9C, REPLACEMENT_CHAR), (0x9D, '\u{FF8A}'),
    (0x9E, '\u{FF8B}'), (0x9F, '\u{FF8C}'), (0xA0, '~'), (0xA1, '\u{203E}'),
    (0xA2, '\u{FF8D}'), (0xA3, '\u{FF8E}'), (0xA4, '\u{FF8F}'), (0xA5, '\u{FF90}'),
    (0xA6, '\u{FF91}'), (0xA7, '\u{FF92}'), (0xA8, '\u{FF93}'), (0xA9, '\u{FF94}'),
    (0xAA, '\u{FF95}'), (0xAB, 's'), (0xAC, '\u{FF96}'), (0xAD, '\u{FF97}'),
    (0xAE, '\u{FF98}'), (0xAF, '\u{FF99}'), (0xB1, '\u{00A2}'), (0xB2, '\\'),
    (0xB3, 't'), (0xB4, 'u'), (0xB5, 'v'), (0xB6, 'w'),
    (0xB7, 'x'), (0xB8, 'y'), (0xB9, 'z'), (0xBA, '\u{FF9A}'),
    (0xBB, '\u{FF9B}'), (0xBC, '\u{FF9C}'), (0xBD, '\u{FF9D}'), (0xBE, '\u{FF9E}'),
    (0xBF, '\u{FF9F}'), (0xCA, REPLACEMENT_CHAR), (0xCB, REPLACEMENT_CHAR), (0xCC, REPLACEMENT_CHAR),
    (0xCD, REPLACEMENT_CHAR), (0xCE, REPLACEMENT_CHAR), (0xCF, REPLACEMENT_CHAR), (0xDA, REPLACEMENT_CHAR),
    (0xDB, REPLACEMENT_CHAR), (0xDC, REPLACEMENT_CHAR), (0xDD, REPLACEMENT_CHAR), (0xDE, REPLACEMENT_CHAR),
    (0xDF, REPLACEMENT_CHAR), (0xE0, '$'), (0xE1, REPLACEMENT_CHAR), (0xEA, REPLACEMENT_CHAR),
    (0xEB, REPLACEMENT_CHAR), (0xEC, REPLACEMENT_CHAR), (0xED, REPLACEMENT_CHAR), (0xEE, REPLACEMENT_CHAR),
    (0xEF, REPLACEMENT_CHAR), (0xFA, REPLACEMENT_CHAR), (0xFB, REPLACEMENT_CHAR), (0xFC, REPLACEMENT_CHAR),
    (0xFD, REPLACEMENT_CHAR), (0xFE, REPLACEMENT_CHAR),
];

/// Single-byte half of CCSID 939, Latin extended (CCSID 1027)
pub(crate) const CP1027_OVERRIDES: [(u8, char); 94] = [
    (0x41, REPLACEMENT_CHAR), (0x42, '\u{FF61}'), (0x43, '\u{FF62}'), (0x44, '\u{FF63}'),
    (0x45, '\u{FF64}'), (0x46, '\u{FF65}'), (0x47, '\u{FF66}'), (0x48, '\u{FF67}'),
    (0x49, '\u{FF68}'), (0x51, '\u{FF69}'), (0x52, '\u{FF6A}'), (0x53, '\u{FF6B}'),
    (0x54, '\u{FF6C}'), (0x55, '\u{FF6D}'), (0x56, '\u{FF6E}'), (0x57, '\u{FF6F}'),
    (0x58, '\u{FF70}'), (0x59, '\u{FF71}'), (0x62, '\u{FF72}'), (0x63, '\u{FF73}'),
    (0x64, '\u{FF74}'), (0x65, '\u{FF75}'), (0x66, '\u{FF76}'), (0x67, '\u{FF77}'),
    (0x68, '\u{FF78}'), (0x69, '\u{FF79}'), (0x6A, REPLACEMENT_CHAR), (0x70, '\u{FF7A}'),
    (0x71, '\u{FF7B}'), (0x72, '\u{FF7C}'), (0x73, '\u{FF7D}'), (0x74, '\u{FF7E}'),
    (0x75, '\u{FF7F}'), (0x76, '\u{FF80}'), (0x77, '\u{FF81}'), (0x78, '\u{FF82}'),
    (0x80, REPLACEMENT_CHAR), (0x8A, '\u{FF83}'), (0x8B, '\u{FF84}'), (0x8C, '\u{FF85}'),
    (0x8D, '\u{FF86}'), (0x8E, '\u{FF87}'), (0x8F, '\u{FF88}'), (0x90, REPLACEMENT_CHAR),
    (0x9A, '\u{FF89}'), (0x9B, '\u{FF8A}'), (0x9C, '\u{FF8B}'), (0x9D, '\u{FF8C}'),
    (0x9E, '\u{FF8D}'), (0x9F, '\u{FF8E}'), (0xA0, '\u{203E}'), (0xAA, '\u{FF8F}'),
    (0xAB, '\u{FF90}'), (0xAC, '\u{FF91}'), (0xAD, '['), (0xAE, '\u{FF92}'),
    (0xAF, '\u{FF93}'), (0xB3, '\u{FF94}'), (0xB4, '\u{FF95}'), (0xB5, '\u{FF96}'),
    (0xB6, '\u{FF97}'), (0xB7, '\u{FF98}'), (0xB8, '\u{FF99}'), (0xB9, '\u{FF9A}'),
    (0xBA, '\u{FF9B}'), (0xBB, '\u{FF9C}'), (0xBC, '\u{FF9D}'), (0xBD, ']'),
    (0xBE, '\u{FF9E}'), (0xBF, '\u{FF9F}'), (0xCA, REPLACEMENT_CHAR), (0xCB, REPLACEMENT_CHAR),
    (0xCC, REPLACEMENT_CHAR), (0xCD, REPLACEMENT_CHAR), (0xCE, REPLACEMENT_CHAR), (0xCF, REPLACEMENT_CHAR),
    (0xDA, REPLACEMENT_CHAR), (0xDB, REPLACEMENT_CHAR), (0xDC, REPLACEMENT_CHAR), (0xDD, REPLACEMENT_CHAR),
    (0xDE, REPLACEMENT_CHAR), (0xDF, REPLACEMENT_CHAR), (0xE1, REPLACEMENT_CHAR), (0xEA, REPLACEMENT_CHAR),
    (0xEB, REPLACEMENT_CHAR), (0xEC, REPLACEMENT_CHAR), (0xED, REPLACEMENT_CHAR), (0xEE, REPLACEMENT_CHAR),
    (0xEF, REPLACEMENT_CHAR), (0xFA, REPLACEMENT_CHAR), (0xFB, REPLACEMENT_CHAR), (0xFC, REPLACEMENT_CHAR),
    (0xFD, REPLACEMENT_CHAR), (0xFE, REPLACEMENT_CHAR),
];
