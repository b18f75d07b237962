/// Standard KiCad library category names, offered as completions when a part
/// is accepted into production.
pub const KICAD_LIBRARY_CATEGORIES: &[&str] = &[
    "Amplifier_Audio",
    "Amplifier_Buffer",
    "Amplifier_Current",
    "Amplifier_Difference",
    "Amplifier_Instrumentation",
    "Amplifier_Operational",
    "Amplifier_Video",
    "Analog",
    "Analog_ADC",
    "Analog_DAC",
    "Analog_Switch",
    "Audio",
    "Battery",
    "Comparator",
    "Connector",
    "Connector_Generic",
    "Converter_ACDC",
    "Converter_DCDC",
    "Device",
    "Diode",
    "Diode_Bridge",
    "Display_Character",
    "Driver_Display",
    "Driver_FET",
    "Driver_LED",
    "Driver_Motor",
    "Driver_Relay",
    "DSP_Microchip_DSPIC33",
    "Filter",
    "FPGA_Lattice",
    "FPGA_Xilinx",
    "GPS",
    "Graphic",
    "Interface",
    "Interface_CAN_LIN",
    "Interface_CurrentLoop",
    "Interface_Ethernet",
    "Interface_Expansion",
    "Interface_HID",
    "Interface_LineDriver",
    "Interface_Optical",
    "Interface_Telecom",
    "Interface_UART",
    "Interface_USB",
    "Isolator",
    "Jumper",
    "LED",
    "Logic",
    "MCU_Espressif",
    "MCU_Microchip_ATmega",
    "MCU_Microchip_ATtiny",
    "MCU_Microchip_PIC",
    "MCU_Nordic",
    "MCU_NXP",
    "MCU_Raspberry_Pi",
    "MCU_ST_STM32",
    "MCU_Texas",
    "Memory_Controller",
    "Memory_EEPROM",
    "Memory_Flash",
    "Memory_RAM",
    "Memory_ROM",
    "Motor",
    "Oscillator",
    "Power_Management",
    "Power_Protection",
    "Power_Supervisor",
    "Reference_Current",
    "Reference_Voltage",
    "Regulator_Controller",
    "Regulator_Current",
    "Regulator_Linear",
    "Regulator_Switching",
    "Relay",
    "Relay_SolidState",
    "RF",
    "RF_Amplifier",
    "RF_Bluetooth",
    "RF_GPS",
    "RF_Mixer",
    "RF_Module",
    "RF_Switch",
    "RF_WiFi",
    "RF_ZigBee",
    "Sensor",
    "Sensor_Audio",
    "Sensor_Current",
    "Sensor_Gas",
    "Sensor_Humidity",
    "Sensor_Magnetic",
    "Sensor_Motion",
    "Sensor_Optical",
    "Sensor_Pressure",
    "Sensor_Proximity",
    "Sensor_Temperature",
    "Sensor_Touch",
    "Sensor_Voltage",
    "Switch",
    "Timer",
    "Timer_PLL",
    "Timer_RTC",
    "Transformer",
    "Transistor_Array",
    "Transistor_BJT",
    "Transistor_FET",
    "Transistor_IGBT",
    "Triac_Thyristor",
    "Valve",
    "Video",
];
